use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct SalesReportQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Period {
    pub fn days(&self) -> i64 {
        match self {
            Period::Daily => 1,
            Period::Weekly => 7,
            Period::Monthly => 30,
            Period::Yearly => 365,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct DashboardQuery {
    pub period: Option<Period>,
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct ProductSales {
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
    pub amount: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub order_count: i64,
    pub revenue: i64,
    pub total_discount: i64,
    pub products: Vec<ProductSales>,
}

#[derive(Debug, Default, Serialize, ToSchema, sqlx::FromRow)]
pub struct StatusCounts {
    pub pending: i64,
    pub delivered: i64,
    pub cancelled: i64,
    pub returned: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Dashboard {
    pub total_sales: i64,
    pub total_orders: i64,
    pub new_users: i64,
    pub statuses: StatusCounts,
    pub products: Vec<ProductSales>,
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct RankedItem {
    pub id: i64,
    pub name: String,
    pub units_sold: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopSelling {
    pub products: Vec<RankedItem>,
    pub categories: Vec<RankedItem>,
}
