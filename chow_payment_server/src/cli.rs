use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 11] = [
        "RUST_LOG",
        "CHOW_HOST",
        "CHOW_PORT",
        "CHOW_DATABASE_URL",
        "CHOW_PAYSTACK_BASE_URL",
        "CHOW_PAYSTACK_CALLBACK_URL",
        "CHOW_PAYSTACK_IP_WHITELIST",
        "CHOW_USE_X_FORWARDED_FOR",
        "CHOW_USE_FORWARDED",
        "CHOW_PENDING_FUNDING_TIMEOUT",
        "CHOW_EXPIRY_CHECK_INTERVAL",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    });
    // Secrets are only reported as present or absent
    const SECRET_ENVS: [&str; 2] = ["CHOW_JWT_SECRET", "CHOW_PAYSTACK_SECRET_KEY"];
    SECRET_ENVS.iter().for_each(|&name| {
        let val = if env::var(name).map(|s| !s.is_empty()).unwrap_or(false) { "****" } else { "Not set" };
        println!("  {name:<35} {val:<15}");
    })
}
