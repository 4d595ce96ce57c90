// No console window on Windows in release; logs reach the server through
// the stderr handle it passes when spawning the monitor
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    std::process::exit(clipmon_lib::run());
}
