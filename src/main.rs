use idl_bindgen::cli;

fn main() {
    let command_line_interface = cli::CommandLineInterface::load();
    if let Err(error) = command_line_interface.run() {
        cli::report_error(&error);
        std::process::exit(1);
    }
}
