fn main() -> anyhow::Result<()> {
    deckwise_cli::run()
}
