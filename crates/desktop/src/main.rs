mod app;
mod player;
mod settings;
mod transcript;
mod workers;

use app::App;

fn main() -> iced::Result {
    env_logger::init();

    iced::application(App::new, App::update, App::view)
        .title("VidScribe \u{2014} Local Video Transcriber")
        .theme(App::theme)
        .subscription(App::subscription)
        .window(iced::window::Settings {
            size: iced::Size::new(1200.0, 800.0),
            min_size: Some(iced::Size::new(800.0, 600.0)),
            // Close handling lives in the app: it force-exits the process
            // instead of waiting on background work.
            exit_on_close_request: false,
            ..Default::default()
        })
        .run()
}
