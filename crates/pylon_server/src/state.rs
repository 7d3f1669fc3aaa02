use pylon_publisher::publisher::PublisherHandle;

#[derive(Clone)]
pub struct AppState {
    pub publisher: PublisherHandle,
    pub accept_config: bool,
}
