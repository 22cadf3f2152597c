use sea_orm_migration::prelude::*;

use crate::m20240101_000002_create_playlists_table::Playlists;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PlaylistTracks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlaylistTracks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PlaylistTracks::PlaylistId).uuid().not_null())
                    .col(
                        ColumnDef::new(PlaylistTracks::SpotifyTrackId)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlaylistTracks::TrackName)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlaylistTracks::ArtistName)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PlaylistTracks::AlbumName).string_len(500))
                    .col(ColumnDef::new(PlaylistTracks::DurationMs).integer())
                    .col(ColumnDef::new(PlaylistTracks::PreviewUrl).text())
                    .col(ColumnDef::new(PlaylistTracks::AlbumArtUrl).text())
                    .col(
                        ColumnDef::new(PlaylistTracks::Position)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PlaylistTracks::AddedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlist_tracks_playlist_id")
                            .from(PlaylistTracks::Table, PlaylistTracks::PlaylistId)
                            .to(Playlists::Table, Playlists::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_playlist_tracks_playlist_id")
                    .table(PlaylistTracks::Table)
                    .col(PlaylistTracks::PlaylistId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PlaylistTracks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PlaylistTracks {
    Table,
    Id,
    PlaylistId,
    SpotifyTrackId,
    TrackName,
    ArtistName,
    AlbumName,
    DurationMs,
    PreviewUrl,
    AlbumArtUrl,
    Position,
    AddedAt,
}
