pub mod debounce;
pub mod lock;
pub mod settings_io;
pub mod vault;
pub mod watcher;

pub use debounce::{ReparseQueue, QUIET_WINDOW};
pub use lock::VaultLock;
pub use settings_io::{read_settings, read_settings_doc, write_settings_doc};
pub use vault::{discover_vault, Vault, VaultError, VaultEvent, SETTINGS_FILE};
pub use watcher::{FileEvent, VaultWatcher};
