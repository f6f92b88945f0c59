pub const APP_TITLE: &str = "E&KFC Spin the Wheel";

// Keys of the local key/value store, kept identical to the installed PWA so
// existing data carries over.
pub const PLAYERS_STORAGE_KEY: &str = "football-wheel-players";
pub const RESULTS_STORAGE_KEY: &str = "football-wheel-results";
pub const SOUND_STORAGE_KEY: &str = "football-wheel-sound";

pub const ASSET_CACHE_NAME: &str = "football-wheel-v1";

pub const DEFAULT_ADMIN_USERNAME: &str = "corze73";
pub const DEFAULT_PLAYERS: [&str; 5] = [
    "John Smith",
    "Mike Johnson",
    "David Wilson",
    "Chris Brown",
    "Tom Davis",
];

pub const RECENT_RESULTS_LIMIT: usize = 50;
pub const MAX_PLAYER_NAME_LENGTH: usize = 50;

pub const INVALID_CREDENTIALS_ERROR: &str = "Invalid credentials";
pub const EMPTY_PLAYER_NAME_ERROR: &str = "Please enter a player name";
pub const PLAYER_NAME_TOO_LONG_ERROR: &str = "Player names can be at most 50 characters";
pub const INAPPROPRIATE_PLAYER_NAME_ERROR: &str = "Please choose a different player name";
pub const DUPLICATE_PLAYER_ERROR: &str = "That player is already on the list";
pub const NO_PLAYER_SELECTED_ERROR: &str = "Please select a player first!";
pub const SPIN_IN_PROGRESS_ERROR: &str = "The wheel is already spinning";
pub const ADMIN_ONLY_ERROR: &str = "Only admins can manage players";
