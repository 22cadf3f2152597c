pub mod user;
pub mod playlist;
pub mod playlist_track;
pub mod user_favorite;
pub mod search_history;

pub use user::Entity as User;
pub use playlist::Entity as Playlist;
pub use playlist_track::Entity as PlaylistTrack;
pub use user_favorite::Entity as UserFavorite;
pub use search_history::Entity as SearchHistory;
