use diesel::{
    Selectable,
    prelude::{Identifiable, Insertable, Queryable},
};
use serde::Serialize;
use utoipa::ToSchema;

// Order mappings

/// A stored association between a SellApp order and the Followiz order that fulfils it.
#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OrderMappingEntity {
    pub id: i32,
    pub sellapp_order_id: String,
    pub followiz_order_id: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
pub struct CreateOrderMappingEntity {
    pub sellapp_order_id: String,
    pub followiz_order_id: String,
}
