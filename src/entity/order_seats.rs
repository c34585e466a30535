use sea_orm::entity::prelude::*;

/// One reserved seat. The `(screening_id, seat)` key is what keeps two live
/// orders from holding the same seat; rows go away with their order.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "order_seats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub screening_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub seat: i32,
    pub order_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id",
        on_delete = "Cascade"
    )]
    Orders,
    #[sea_orm(
        belongs_to = "super::screenings::Entity",
        from = "Column::ScreeningId",
        to = "super::screenings::Column::Id"
    )]
    Screenings,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::screenings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Screenings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
