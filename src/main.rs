fn main() -> anyhow::Result<()> {
    dialogc_rust::run()
}
