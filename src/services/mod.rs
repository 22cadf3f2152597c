pub mod spotify;

pub use spotify::SpotifyService;
