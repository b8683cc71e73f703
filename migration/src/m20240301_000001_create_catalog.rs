use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_len_uniq(Users::Username, 150))
                    .col(string(Users::PasswordHash))
                    .col(big_integer(Users::Joined))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Person::Table)
                    .if_not_exists()
                    .col(pk_auto(Person::Id))
                    .col(string_len(Person::FirstName, 140))
                    .col(string_len(Person::LastName, 140))
                    .col(string(Person::Born))
                    .col(string_null(Person::Died))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_person_name")
                    .table(Person::Table)
                    .col(Person::LastName)
                    .col(Person::FirstName)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Movie::Table)
                    .if_not_exists()
                    .col(pk_auto(Movie::Id))
                    .col(string_len(Movie::Title, 140))
                    .col(string_len_uniq(Movie::Slug, 200))
                    .col(text(Movie::Plot))
                    .col(integer(Movie::Year))
                    .col(integer(Movie::Rating).default(0))
                    .col(integer(Movie::Runtime))
                    .col(string_null(Movie::Website))
                    .col(integer_null(Movie::DirectorId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_director")
                            .from(Movie::Table, Movie::DirectorId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_year_title")
                    .table(Movie::Table)
                    .col(Movie::Year)
                    .col(Movie::Title)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieWriter::Table)
                    .if_not_exists()
                    .col(integer(MovieWriter::MovieId))
                    .col(integer(MovieWriter::PersonId))
                    .primary_key(
                        Index::create().col(MovieWriter::MovieId).col(MovieWriter::PersonId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_writer_movie")
                            .from(MovieWriter::Table, MovieWriter::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_writer_person")
                            .from(MovieWriter::Table, MovieWriter::PersonId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Role::Table)
                    .if_not_exists()
                    .col(pk_auto(Role::Id))
                    .col(integer(Role::MovieId))
                    .col(integer(Role::PersonId))
                    .col(string_len(Role::Name, 140))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_movie")
                            .from(Role::Table, Role::MovieId)
                            .to(Movie::Table, Movie::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_person")
                            .from(Role::Table, Role::PersonId)
                            .to(Person::Table, Person::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_role_unique")
                    .table(Role::Table)
                    .col(Role::MovieId)
                    .col(Role::PersonId)
                    .col(Role::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(pk_auto(Vote::Id))
                    .col(small_integer(Vote::Value))
                    .col(integer(Vote::UserId))
                    .col(integer(Vote::MovieId))
                    .col(big_integer(Vote::VotedOn))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_user")
                            .from(Vote::Table, Vote::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_movie")
                            .from(Vote::Table, Vote::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vote_user_movie")
                    .table(Vote::Table)
                    .col(Vote::UserId)
                    .col(Vote::MovieId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieImage::Table)
                    .if_not_exists()
                    .col(pk_auto(MovieImage::Id))
                    .col(string(MovieImage::Image))
                    .col(big_integer(MovieImage::Uploaded))
                    .col(integer(MovieImage::MovieId))
                    .col(integer(MovieImage::UserId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_image_movie")
                            .from(MovieImage::Table, MovieImage::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_image_user")
                            .from(MovieImage::Table, MovieImage::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MovieImage::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Vote::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Role::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieWriter::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movie::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Person::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    PasswordHash,
    Joined,
}

#[derive(DeriveIden)]
enum Person {
    Table,
    Id,
    FirstName,
    LastName,
    Born,
    Died,
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    Id,
    Title,
    Slug,
    Plot,
    Year,
    Rating,
    Runtime,
    Website,
    DirectorId,
}

#[derive(DeriveIden)]
enum MovieWriter {
    Table,
    MovieId,
    PersonId,
}

#[derive(DeriveIden)]
enum Role {
    Table,
    Id,
    MovieId,
    PersonId,
    Name,
}

#[derive(DeriveIden)]
enum Vote {
    Table,
    Id,
    Value,
    UserId,
    MovieId,
    VotedOn,
}

#[derive(DeriveIden)]
enum MovieImage {
    Table,
    Id,
    Image,
    Uploaded,
    MovieId,
    UserId,
}
