fn main() -> anyhow::Result<()> {
    terrain_sandbox::run()
}
