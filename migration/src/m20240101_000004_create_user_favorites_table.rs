use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserFavorites::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserFavorites::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserFavorites::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(UserFavorites::SpotifyTrackId)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserFavorites::TrackName)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserFavorites::ArtistName)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserFavorites::AlbumArtUrl).text())
                    .col(
                        ColumnDef::new(UserFavorites::AddedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_favorites_user_id")
                            .from(UserFavorites::Table, UserFavorites::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A user can favorite a given track only once
        manager
            .create_index(
                Index::create()
                    .name("idx_user_favorites_user_track")
                    .table(UserFavorites::Table)
                    .col(UserFavorites::UserId)
                    .col(UserFavorites::SpotifyTrackId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserFavorites::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum UserFavorites {
    Table,
    Id,
    UserId,
    SpotifyTrackId,
    TrackName,
    ArtistName,
    AlbumArtUrl,
    AddedAt,
}
