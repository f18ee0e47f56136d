use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::{
    audit,
    dto::offers::{CreateOfferRequest, OfferList, OfferView},
    entity::{
        offers::{ActiveModel, Column, Entity as Offers},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    models::Offer,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Percentage of the offer running on `product_id` at `now`, if any.
pub async fn active_percentage<C: ConnectionTrait>(
    conn: &C,
    product_id: i64,
    now: DateTime<Utc>,
) -> Result<Option<i32>, DbErr> {
    let offer = Offers::find()
        .filter(
            Condition::all()
                .add(Column::ProductId.eq(product_id))
                .add(Column::StartsAt.lte(now))
                .add(Column::EndsAt.gte(now)),
        )
        .order_by_desc(Column::StartsAt)
        .one(conn)
        .await?;
    Ok(offer.map(|offer| offer.discount_percentage))
}

pub async fn add_offer(
    state: &AppState,
    admin: &AdminUser,
    payload: CreateOfferRequest,
) -> AppResult<ApiResponse<Offer>> {
    if !(1..=100).contains(&payload.discount_percentage) {
        return Err(AppError::BadRequest(
            "discount percentage must be between 1 and 100".into(),
        ));
    }
    if payload.ends_at < payload.starts_at {
        return Err(AppError::BadRequest(
            "end date must not be before start date".into(),
        ));
    }

    let product = Products::find_by_id(payload.product_id)
        .filter(ProdCol::Deleted.eq(false))
        .one(&state.orm)
        .await?;
    if product.is_none() {
        return Err(AppError::NotFound);
    }

    // Overlapping windows would put two offers on the product at once.
    let overlapping = Offers::find()
        .filter(
            Condition::all()
                .add(Column::ProductId.eq(payload.product_id))
                .add(Column::StartsAt.lte(payload.ends_at))
                .add(Column::EndsAt.gte(payload.starts_at)),
        )
        .one(&state.orm)
        .await?;
    if overlapping.is_some() {
        return Err(AppError::Conflict(
            "an offer already exists for this product in that period".into(),
        ));
    }

    let offer = ActiveModel {
        id: NotSet,
        product_id: Set(payload.product_id),
        discount_percentage: Set(payload.discount_percentage),
        starts_at: Set(payload.starts_at.into()),
        ends_at: Set(payload.ends_at.into()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        state,
        None,
        "offer_add",
        "offers",
        serde_json::json!({ "offer_id": offer.id, "product_id": offer.product_id, "actor": admin.subject }),
    )
    .await;

    Ok(ApiResponse::success(
        "Offer added",
        Offer::from(offer),
        Some(Meta::empty()),
    ))
}

/// Removes the product's current and upcoming offers.
pub async fn remove_offer(
    state: &AppState,
    admin: &AdminUser,
    product_id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Offers::delete_many()
        .filter(
            Condition::all()
                .add(Column::ProductId.eq(product_id))
                .add(Column::EndsAt.gte(Utc::now())),
        )
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        None,
        "offer_remove",
        "offers",
        serde_json::json!({ "product_id": product_id, "actor": admin.subject }),
    )
    .await;

    Ok(ApiResponse::success(
        "Offer removed",
        serde_json::json!({ "removed": result.rows_affected }),
        Some(Meta::empty()),
    ))
}

pub async fn list_offers(state: &AppState) -> AppResult<ApiResponse<OfferList>> {
    let items = sqlx::query_as::<_, OfferView>(
        r#"
        SELECT o.id, o.product_id, p.name AS product_name, o.discount_percentage,
               o.starts_at, o.ends_at
        FROM offers o
        JOIN products p ON p.id = o.product_id
        WHERE o.ends_at >= NOW()
        ORDER BY o.starts_at
        "#,
    )
    .fetch_all(state.pool())
    .await?;

    Ok(ApiResponse::success("Offers", OfferList { items }, None))
}
