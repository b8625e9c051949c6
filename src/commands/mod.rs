pub type CmdResult<T> = dockhand::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod build;
pub mod check;
pub mod publish;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (dockhand::Result<serde_json::Value>, i32) {
    crate::tty::status("dockhand is working...");

    match command {
        // `all` builds and nothing more; publish stays its own entry point
        crate::Commands::Build(args) | crate::Commands::All(args) => {
            dispatch!(args, global, build)
        }
        crate::Commands::Publish(args) => dispatch!(args, global, publish),
        crate::Commands::Check(args) => dispatch!(args, global, check),
    }
}
