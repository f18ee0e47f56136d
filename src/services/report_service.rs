//! Read-only aggregates over placed orders, run as plain SQL on the pool.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;

use crate::{
    dto::reports::{
        Dashboard, DashboardQuery, Period, ProductSales, RankedItem, SalesReport,
        SalesReportQuery, StatusCounts, TopSelling,
    },
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    response::{ApiResponse, Meta},
    state::AppState,
};

const TOP_SELLING_LIMIT: i64 = 10;

#[derive(FromRow)]
struct SalesTotals {
    order_count: i64,
    revenue: i64,
    total_discount: i64,
}

fn start_of(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Orders that still count as sales.
const SOLD: &str = "o.status NOT IN ('Cancelled', 'Returned')";

async fn sales_totals(
    state: &AppState,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> AppResult<SalesTotals> {
    let totals = sqlx::query_as::<_, SalesTotals>(&format!(
        r#"
        SELECT COUNT(*) AS order_count,
               COALESCE(SUM(o.total_amount), 0)::BIGINT AS revenue,
               COALESCE(SUM(o.coupon_discount + o.offer_discount), 0)::BIGINT AS total_discount
        FROM orders o
        WHERE o.created_at >= $1 AND o.created_at < $2 AND {SOLD}
        "#
    ))
    .bind(from)
    .bind(to)
    .fetch_one(state.pool())
    .await?;
    Ok(totals)
}

async fn product_sales(
    state: &AppState,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> AppResult<Vec<ProductSales>> {
    let rows = sqlx::query_as::<_, ProductSales>(&format!(
        r#"
        SELECT p.id AS product_id, p.name,
               SUM(oi.quantity)::BIGINT AS quantity,
               SUM(oi.subtotal)::BIGINT AS amount
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        JOIN products p ON p.id = oi.product_id
        WHERE o.created_at >= $1 AND o.created_at < $2 AND {SOLD}
        GROUP BY p.id, p.name
        ORDER BY quantity DESC, p.name
        "#
    ))
    .bind(from)
    .bind(to)
    .fetch_all(state.pool())
    .await?;
    Ok(rows)
}

pub async fn sales_report(
    state: &AppState,
    _admin: &AdminUser,
    query: SalesReportQuery,
) -> AppResult<ApiResponse<SalesReport>> {
    if query.end < query.start {
        return Err(AppError::BadRequest(
            "end date must not be before start date".into(),
        ));
    }
    let from = start_of(query.start);
    let to = start_of(query.end) + Duration::days(1);

    let totals = sales_totals(state, from, to).await?;
    let products = product_sales(state, from, to).await?;

    Ok(ApiResponse::success(
        "Sales report",
        SalesReport {
            start: query.start,
            end: query.end,
            order_count: totals.order_count,
            revenue: totals.revenue,
            total_discount: totals.total_discount,
            products,
        },
        Some(Meta::empty()),
    ))
}

pub async fn dashboard(
    state: &AppState,
    _admin: &AdminUser,
    query: DashboardQuery,
) -> AppResult<ApiResponse<Dashboard>> {
    let period = query.period.unwrap_or(Period::Daily);
    let to = Utc::now();
    let from = to - Duration::days(period.days());

    let totals = sales_totals(state, from, to).await?;
    let products = product_sales(state, from, to).await?;

    let new_users: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE created_at >= $1 AND created_at < $2")
            .bind(from)
            .bind(to)
            .fetch_one(state.pool())
            .await?;

    let statuses = sqlx::query_as::<_, StatusCounts>(
        r#"
        SELECT COUNT(*) FILTER (WHERE status IN ('Pending', 'Pending COD Verification')) AS pending,
               COUNT(*) FILTER (WHERE status = 'Delivered') AS delivered,
               COUNT(*) FILTER (WHERE status = 'Cancelled') AS cancelled,
               COUNT(*) FILTER (WHERE status = 'Returned') AS returned
        FROM orders
        WHERE created_at >= $1 AND created_at < $2
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_one(state.pool())
    .await?;

    Ok(ApiResponse::success(
        "Dashboard",
        Dashboard {
            total_sales: totals.revenue,
            total_orders: totals.order_count,
            new_users: new_users.0,
            statuses,
            products,
        },
        Some(Meta::empty()),
    ))
}

/// Best sellers by units on orders whose payment was collected.
pub async fn top_selling(
    state: &AppState,
    _admin: &AdminUser,
) -> AppResult<ApiResponse<TopSelling>> {
    let products = sqlx::query_as::<_, RankedItem>(
        r#"
        SELECT p.id, p.name, SUM(oi.quantity)::BIGINT AS units_sold
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        JOIN products p ON p.id = oi.product_id
        WHERE o.payment_status IN ('Paid', 'Completed')
        GROUP BY p.id, p.name
        ORDER BY units_sold DESC, p.name
        LIMIT $1
        "#,
    )
    .bind(TOP_SELLING_LIMIT)
    .fetch_all(state.pool())
    .await?;

    let categories = sqlx::query_as::<_, RankedItem>(
        r#"
        SELECT c.id, c.name, SUM(oi.quantity)::BIGINT AS units_sold
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        JOIN products p ON p.id = oi.product_id
        JOIN categories c ON c.id = p.category_id
        WHERE o.payment_status IN ('Paid', 'Completed')
        GROUP BY c.id, c.name
        ORDER BY units_sold DESC, c.name
        LIMIT $1
        "#,
    )
    .bind(TOP_SELLING_LIMIT)
    .fetch_all(state.pool())
    .await?;

    Ok(ApiResponse::success(
        "Top selling",
        TopSelling {
            products,
            categories,
        },
        Some(Meta::empty()),
    ))
}
