fn main() -> anyhow::Result<()> {
    pos_assistant_lib::run()
}
