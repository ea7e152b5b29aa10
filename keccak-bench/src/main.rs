fn main() -> anyhow::Result<()> {
    keccak_bench::run()
}
