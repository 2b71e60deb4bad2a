/// Which page of the photo gallery is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    Gallery,
    Preview,
    Editor,
}
