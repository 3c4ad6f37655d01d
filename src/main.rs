fn main() {
    if let Err(err) = chat_lib::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
