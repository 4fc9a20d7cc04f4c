fn main() {
    std::process::exit(brawlr_lib::run())
}
