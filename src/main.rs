fn main() -> anyhow::Result<()> {
    topic_filter::run()
}
