use log::*;
use sqlx::SqliteConnection;

use crate::{
    cpe_api::order_objects::OrderTransition,
    db_types::{LineItem, NewOrder, Order, Principal, Role, SettlementLeg},
    traits::OrderStoreError,
};

/// Inserts the order and its line items. This is not atomic on its own; pass `&mut *tx` if it needs to be.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderStoreError> {
    let total_price = order.total_price().ok_or_else(|| OrderStoreError::InvalidOrder("Order total overflows".into()))?;
    let mut stored: Order = sqlx::query_as(
        r#"INSERT INTO orders (customer_id, vendor_id, total_price, delivery_fee)
           VALUES ($1, $2, $3, $4)
           RETURNING *"#,
    )
    .bind(&order.customer_id)
    .bind(&order.vendor_id)
    .bind(total_price)
    .bind(order.delivery_fee)
    .fetch_one(&mut *conn)
    .await?;
    for item in &order.items {
        sqlx::query("INSERT INTO order_items (order_id, menu_item_id, quantity, unit_price) VALUES ($1, $2, $3, $4)")
            .bind(stored.id)
            .bind(&item.menu_item_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *conn)
            .await?;
    }
    stored.items = order.items;
    debug!("📦️ Order #{} for customer {} stored. Total: {total_price}", stored.id, stored.customer_id);
    Ok(stored)
}

async fn fetch_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<LineItem>, OrderStoreError> {
    let items = sqlx::query_as("SELECT menu_item_id, quantity, unit_price FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

async fn with_items(mut orders: Vec<Order>, conn: &mut SqliteConnection) -> Result<Vec<Order>, OrderStoreError> {
    for order in orders.iter_mut() {
        order.items = fetch_items(order.id, conn).await?;
    }
    Ok(orders)
}

/// The order row without its line items.
pub async fn fetch_order_row(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, OrderStoreError> {
    match fetch_order_row(order_id, &mut *conn).await? {
        Some(mut order) => {
            order.items = fetch_items(order.id, conn).await?;
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

pub async fn fetch_orders_for_party(
    party: &Principal,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderStoreError> {
    let column = match party.role {
        Role::Customer => "customer_id",
        Role::Vendor => "vendor_id",
        Role::Rider => "rider_id",
    };
    let sql = format!("SELECT * FROM orders WHERE {column} = $1 ORDER BY created_at DESC, id DESC");
    let orders = sqlx::query_as(&sql).bind(&party.id).fetch_all(&mut *conn).await?;
    with_items(orders, conn).await
}

pub async fn fetch_orders_available_for_pickup(conn: &mut SqliteConnection) -> Result<Vec<Order>, OrderStoreError> {
    let orders = sqlx::query_as(
        r#"SELECT * FROM orders
           WHERE order_status = 'new' AND available_for_pickup = 1 AND picked_up = 0
           AND accepted_status <> 'declined'
           ORDER BY created_at ASC, id ASC"#,
    )
    .fetch_all(&mut *conn)
    .await?;
    with_items(orders, conn).await
}

/// Writes the transition as a single `UPDATE` whose `WHERE` clause is the transition's precondition.
///
/// Returns `None` if the precondition did not hold (or the order does not exist), in which case nothing was written.
pub async fn try_transition(
    order_id: i64,
    transition: &OrderTransition,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderStoreError> {
    let query = match transition {
        OrderTransition::Respond { vendor_id, accept } => {
            let status = if *accept { "accepted" } else { "declined" };
            sqlx::query_as(
                r#"UPDATE orders SET
                     accepted_status = $1,
                     available_for_pickup = CASE WHEN $1 = 'declined' THEN 0 ELSE available_for_pickup END,
                     updated_at = CURRENT_TIMESTAMP
                   WHERE id = $2 AND vendor_id = $3 AND order_status = 'new' AND accepted_status = 'pending'
                   RETURNING *"#,
            )
            .bind(status)
            .bind(order_id)
            .bind(vendor_id)
        },
        OrderTransition::SetAvailability { vendor_id, available } => sqlx::query_as(
            r#"UPDATE orders SET available_for_pickup = $1, updated_at = CURRENT_TIMESTAMP
               WHERE id = $2 AND vendor_id = $3 AND order_status = 'new'
               AND ($1 = 0 OR accepted_status <> 'declined')
               RETURNING *"#,
        )
        .bind(*available)
        .bind(order_id)
        .bind(vendor_id),
        OrderTransition::AcceptPickup { rider_id } => sqlx::query_as(
            r#"UPDATE orders SET
                 picked_up = 1, available_for_pickup = 0, order_status = 'in-transit', rider_id = $1,
                 updated_at = CURRENT_TIMESTAMP
               WHERE id = $2 AND order_status = 'new' AND available_for_pickup = 1 AND picked_up = 0
               AND accepted_status <> 'declined'
               RETURNING *"#,
        )
        .bind(rider_id)
        .bind(order_id),
        OrderTransition::MarkDelivered { rider_id } => sqlx::query_as(
            r#"UPDATE orders SET order_status = 'delivered', delivered_status = 1, updated_at = CURRENT_TIMESTAMP
               WHERE id = $1 AND rider_id = $2 AND order_status = 'in-transit'
               RETURNING *"#,
        )
        .bind(order_id)
        .bind(rider_id),
        OrderTransition::ConfirmDelivery { customer_id } => sqlx::query_as(
            r#"UPDATE orders SET confirm_delivered_by_customer = 1, updated_at = CURRENT_TIMESTAMP
               WHERE id = $1 AND customer_id = $2 AND order_status = 'delivered' AND confirm_delivered_by_customer = 0
               RETURNING *"#,
        )
        .bind(order_id)
        .bind(customer_id),
    };
    let updated: Option<Order> = query.fetch_optional(&mut *conn).await?;
    match updated {
        Some(mut order) => {
            order.items = fetch_items(order.id, conn).await?;
            trace!("📦️ Order #{order_id}: {transition} applied");
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

/// Flags a settlement leg as paid. The guard repeats the settlement precondition, so this returns `false` if the order
/// is not delivered and confirmed, or if the leg was already paid by a concurrent caller.
pub async fn mark_leg_paid(
    order_id: i64,
    leg: SettlementLeg,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let sql = match leg {
        SettlementLeg::Vendor => {
            r#"UPDATE orders SET vendor_paid = 1, updated_at = CURRENT_TIMESTAMP
               WHERE id = $1 AND vendor_paid = 0 AND order_status = 'delivered' AND confirm_delivered_by_customer = 1"#
        },
        SettlementLeg::Rider => {
            r#"UPDATE orders SET rider_paid = 1, updated_at = CURRENT_TIMESTAMP
               WHERE id = $1 AND rider_paid = 0 AND rider_id IS NOT NULL
               AND order_status = 'delivered' AND confirm_delivered_by_customer = 1"#
        },
    };
    let rows = sqlx::query(sql).bind(order_id).execute(conn).await?.rows_affected();
    Ok(rows == 1)
}
