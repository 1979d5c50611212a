fn main() {
    collector_harness::cli::run();
}
