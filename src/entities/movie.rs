use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "movie")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub plot: String,
    pub year: i32,
    pub rating: i32,
    pub runtime: i32,
    pub website: Option<String>,
    pub director_id: Option<i32>,
}

impl Model {
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.title, self.year)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::DirectorId",
        to = "super::person::Column::Id",
        on_delete = "SetNull"
    )]
    Director,
    #[sea_orm(has_many = "super::movie_writer::Entity")]
    MovieWriter,
    #[sea_orm(has_many = "super::role::Entity")]
    Role,
    #[sea_orm(has_many = "super::vote::Entity")]
    Vote,
    #[sea_orm(has_many = "super::movie_image::Entity")]
    MovieImage,
}

impl Related<super::movie_writer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieWriter.def()
    }
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vote.def()
    }
}

impl Related<super::movie_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieImage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
