fn main() -> anyhow::Result<()> {
    hogpak::cli::run_cli()
}
