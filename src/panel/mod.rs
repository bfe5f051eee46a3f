/// Panel automation module.
///
/// This module owns the only mutable state shared between monitors: a
/// single lazily-created browser-automation session used to click through
/// the hosting panel's restart flow. All access is serialized by
/// [`RestartClient`]; the WebDriver wire protocol lives in its own
/// submodule behind the [`PanelSession`] seam.
///
/// # Components
///
/// * `session` - The serialized restart client, session lifecycle, and the
///   authenticate-and-act protocol against both panel backends
/// * `webdriver` - W3C WebDriver implementation of the session traits
pub mod session;
pub mod webdriver;

pub use session::{PanelCredentials, PanelRestarter, PanelSession, RestartClient, SessionFactory};
pub use webdriver::{WebDriverFactory, WebDriverSession};
