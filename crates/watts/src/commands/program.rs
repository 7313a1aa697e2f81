//! Weekly program commands.

use watts_core::Coordinator;

use crate::cli::{GlobalOpts, OutputFormat, ProgramArgs, ProgramCommand};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    coordinator: &Coordinator,
    args: ProgramArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ProgramCommand::Show(target) => {
            let device = util::resolve_device(coordinator, &target.device)?;
            let program = coordinator.convert_program(&device.id).await?;
            let out = match global.output {
                OutputFormat::JsonCompact => serde_json::to_string(&program)?,
                _ => serde_json::to_string_pretty(&program)?,
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }
        ProgramCommand::Apply { target, file } => {
            let device = util::resolve_device(coordinator, &target.device)?;
            let value = util::read_json_file(&file)?;
            let program = value.as_object().ok_or_else(|| CliError::Validation {
                field: "file".into(),
                reason: "expected a JSON object at the top level".into(),
            })?;

            coordinator.apply_program(&device.id, program).await?;
            output::print_output(
                &format!("Program applied to {}", device.display_name()),
                global.quiet,
            );
            Ok(())
        }
    }
}
