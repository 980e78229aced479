use stagerun::error::AppResult;

fn main() -> AppResult<()> {
    stagerun::entry::run()
}
