fn main() {
    playoff_bracket_lib::run()
}
