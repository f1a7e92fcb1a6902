use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "visitors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub visitor_key: String,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub first_seen: DateTimeWithTimeZone,
    pub last_seen: DateTimeWithTimeZone,
    pub visit_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::page_visits::Entity")]
    PageVisits,
}

impl Related<super::page_visits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PageVisits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
