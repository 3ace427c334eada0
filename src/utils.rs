use std::io;
use std::process::{Child, Command};

/// Opens `url` in the default browser.
pub fn open_browser(url: &str) -> io::Result<Child> {
    #[cfg(target_os = "windows")]
    {
        // Empty title so "start" does not take the URL as the window title
        Command::new("cmd").args(["/C", "start", "", url]).spawn()
    }

    #[cfg(target_os = "macos")]
    {
        Command::new("open").arg(url).spawn()
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        Command::new("xdg-open").arg(url).spawn()
    }
}
