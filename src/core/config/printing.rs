use crate::core::config::data::{path_display, Config};

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        match &self.worldbook_path {
            Some(path) => println!("  worldbook-path: {}", path_display(path)),
            None => match self.worldbook_path_or_default() {
                Some(path) => println!("  worldbook-path: (default: {})", path_display(path)),
                None => println!("  worldbook-path: (unset)"),
            },
        }
    }
}
