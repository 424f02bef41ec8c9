//! Demo binary: the full backdrop with keyboard navigation.
//!
//! Digits 1-6 jump between the site's routes; WASD rotates the world.

use backdrop::{AppConfig, KeyCode, pages, run_with_config};

const ROUTES: [(KeyCode, &str); 6] = [
    (KeyCode::Digit1, "/"),
    (KeyCode::Digit2, "/contact/"),
    (KeyCode::Digit3, "/projects/"),
    (KeyCode::Digit4, "/case-studies/kiosk/"),
    (KeyCode::Digit5, "/case-studies/automation/"),
    (KeyCode::Digit6, "/case-studies/product-tour/"),
];

fn main() -> Result<(), winit::error::EventLoopError> {
    env_logger::init();

    let config = AppConfig::new().title("Backdrop Demo").size(1280, 720);
    run_with_config(config, pages::routes(), pages::registry(), |_manager| {
        move |frame| {
            for (key, path) in ROUTES {
                if frame.input.key_pressed(key) {
                    frame.navigate(path);
                }
            }
        }
    })
}
