use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "person")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    /// ISO date, `YYYY-MM-DD`
    pub born: String,
    pub died: Option<String>,
}

impl Model {
    pub fn display_name(&self) -> String {
        match &self.died {
            Some(died) => format!("{}, {} ({}-{})", self.last_name, self.first_name, self.born, died),
            None => format!("{}, {} ({})", self.last_name, self.first_name, self.born),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::role::Entity")]
    Role,
    #[sea_orm(has_many = "super::movie_writer::Entity")]
    MovieWriter,
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl Related<super::movie_writer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieWriter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
