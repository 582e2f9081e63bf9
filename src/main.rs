use costlens::app::App;
use costlens::cli::Cli;
use costlens::{logging, router};

fn main() -> miette::Result<()> {
    let cli = Cli::new();

    logging::init(cli.verbose);

    let format = cli.command.output_format();
    let unformatted = cli.unformatted;

    let mut app = App::new(cli);

    let output = router::route(&mut app)?.render(format, unformatted)?;

    app.spinner.stop_with_message(&output);

    Ok(())
}
