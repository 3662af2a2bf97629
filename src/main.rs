fn main() {
    spawnpool::game::run();
}
