fn main() -> anyhow::Result<()> {
    groove::runtime::run()
}
