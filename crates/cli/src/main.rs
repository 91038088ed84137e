use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::thread::JoinHandle;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::{Receiver, Sender};

use face_sentry_core::annotation::infrastructure::cpu_frame_annotator::CpuFrameAnnotator;
use face_sentry_core::control::command::Command;
use face_sentry_core::detection::infrastructure::scripted_face_detector::ScriptedFaceDetector;
use face_sentry_core::detection::infrastructure::two_stage_detector::{
    PassThroughRefiner, TwoStageFaceDetector,
};
use face_sentry_core::pipeline::frame_disposition::PoolFrameReturn;
use face_sentry_core::pipeline::frame_processor::FrameProcessor;
use face_sentry_core::pipeline::infrastructure::threaded_recognition_executor::ThreadedRecognitionExecutor;
use face_sentry_core::pipeline::pipeline_executor::{
    GuardingMode, RecognitionChannels, RecognitionExecutor,
};
use face_sentry_core::pipeline::pipeline_logger::LogPipelineLogger;
use face_sentry_core::pipeline::position_report::PositionReport;
use face_sentry_core::pipeline::recognition_config::RecognitionConfig;
use face_sentry_core::recognition::domain::enrollment_store::{
    EnrollmentStore, VolatileEnrollmentStore,
};
use face_sentry_core::recognition::infrastructure::json_enrollment_store::JsonEnrollmentStore;
use face_sentry_core::recognition::infrastructure::landmark_recognizer::LandmarkRecognizer;
use face_sentry_core::shared::frame::Frame;
use face_sentry_core::video::domain::frame_reader::FrameReader;
use face_sentry_core::video::domain::frame_writer::FrameWriter;
use face_sentry_core::video::infrastructure::image_sequence_reader::ImageSequenceReader;
use face_sentry_core::video::infrastructure::image_sequence_writer::ImageSequenceWriter;

/// Face enrollment and recognition over a stream of camera frames.
///
/// Position reports are printed to stdout as JSON lines while guarding
/// mode is on.
#[derive(Parser)]
#[command(name = "face-sentry")]
struct Cli {
    /// Directory of input frames, processed in file-name order.
    input: PathBuf,

    /// Directory for annotated frames. Without it frames go back to the
    /// source's buffer pool.
    output: Option<PathBuf>,

    /// JSON file mapping frame index to detected faces.
    #[arg(long)]
    detections: PathBuf,

    /// Pipeline configuration file (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start with guarding mode on.
    #[arg(long)]
    guarding: bool,

    /// Enrollment database, overriding the configuration file.
    #[arg(long)]
    enrollment_db: Option<PathBuf>,

    /// Queue a command once frame N has been fed, e.g. `12:enroll-foe`.
    #[arg(long = "at", value_parser = parse_scheduled)]
    scheduled: Vec<(usize, Command)>,

    /// Read commands from stdin: detect, enroll-foe, enroll-friend,
    /// recognize, delete, `guard on`, `guard off`.
    #[arg(long)]
    interactive: bool,

    /// Delay between frames in milliseconds.
    #[arg(long, default_value = "0")]
    frame_interval_ms: u64,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let mut config = match &cli.config {
        Some(path) => RecognitionConfig::load(path)?,
        None => RecognitionConfig::default(),
    };
    if let Some(db) = &cli.enrollment_db {
        config.enrollment_path = Some(db.clone());
    }

    let mut reader = ImageSequenceReader::new();
    let total = reader.open(&cli.input)?;
    log::info!("Found {total} frames in {}", cli.input.display());

    let processor = build_processor(&cli.detections, &config)?;
    let guarding = GuardingMode::new(cli.guarding);
    let capacity = config.channel_capacity;

    let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Frame>(capacity);
    let (command_tx, command_rx) = crossbeam_channel::bounded::<Command>(capacity);
    let (result_tx, result_rx) = crossbeam_channel::bounded::<PositionReport>(capacity);
    let mut channels = RecognitionChannels::new(frame_rx)
        .with_commands(command_rx)
        .with_results(result_tx);

    let mut pool = None;
    let mut writer_handle = None;
    match &cli.output {
        Some(dir) => {
            let (sink_tx, sink_rx) = crossbeam_channel::bounded::<Frame>(capacity);
            channels = channels.with_frame_sink(sink_tx);
            writer_handle = Some(spawn_writer(Box::new(ImageSequenceWriter::new(dir)), sink_rx)?);
        }
        None if config.return_frames => {
            let (pool_tx, pool_rx) = crossbeam_channel::bounded::<Frame>(config.frame_buffers);
            channels = channels.with_return_hook(Box::new(PoolFrameReturn::new(pool_tx)));
            pool = Some((pool_rx, config.frame_buffers));
        }
        None => {}
    }

    let executor = ThreadedRecognitionExecutor::from_config(&config);
    let handle = executor.start(processor, channels, guarding.clone())?;

    if cli.interactive {
        spawn_stdin_commands(command_tx.clone(), guarding)?;
    }
    let feeder = Feeder {
        frames: frame_tx,
        commands: command_tx,
        scheduled: cli.scheduled,
        pool,
        interval: Duration::from_millis(cli.frame_interval_ms),
    };
    let feeder_handle = std::thread::Builder::new()
        .name("frame-feeder".into())
        .spawn(move || feeder.run(reader))?;

    print_reports(&result_rx)?;

    let processor = handle.wait()?;
    let fed = feeder_handle
        .join()
        .map_err(|_| "Feeder thread panicked")??;
    if let Some(writer) = writer_handle {
        let written = writer.join().map_err(|_| "Writer thread panicked")??;
        log::info!("Wrote {written} annotated frames");
    }

    log::info!(
        "Processed {} of {fed} frames, {} IDs enrolled",
        processor.frames_processed(),
        processor.recognizer().enrolled_count()
    );
    Ok(())
}

fn build_processor(
    detections: &Path,
    config: &RecognitionConfig,
) -> Result<FrameProcessor, Box<dyn std::error::Error>> {
    let script = ScriptedFaceDetector::from_json_file(detections)?;
    let detector = TwoStageFaceDetector::new(
        Box::new(script),
        Box::new(PassThroughRefiner),
        config.detection.clone(),
    );

    let store: Box<dyn EnrollmentStore> = match &config.enrollment_path {
        Some(path) => {
            log::info!("Enrollment database: {}", path.display());
            Box::new(JsonEnrollmentStore::new(path))
        }
        None => Box::new(VolatileEnrollmentStore::default()),
    };
    let recognizer = LandmarkRecognizer::new(store, config.similarity_threshold);

    Ok(FrameProcessor::new(
        Box::new(detector),
        Box::new(recognizer),
        Box::new(CpuFrameAnnotator::new()),
        config,
    )
    .with_logger(Box::new(LogPipelineLogger::default())))
}

/// Upstream side of the pipeline: feeds decoded frames and scheduled
/// commands, and recycles returned buffers.
struct Feeder {
    frames: Sender<Frame>,
    commands: Sender<Command>,
    scheduled: Vec<(usize, Command)>,
    pool: Option<(Receiver<Frame>, usize)>,
    interval: Duration,
}

impl Feeder {
    fn run(self, mut reader: ImageSequenceReader) -> Result<usize, String> {
        let mut in_flight = 0usize;
        let mut fed = 0usize;

        for frame in reader.frames() {
            let frame = frame.map_err(|e| e.to_string())?;
            let index = frame.index();

            if let Some((returned, buffers)) = &self.pool {
                if in_flight >= *buffers {
                    if returned.recv().is_err() {
                        break;
                    }
                    in_flight -= 1;
                }
                in_flight += 1;
            }

            if self.frames.send(frame).is_err() {
                log::warn!("Frame worker stopped before frame {index}");
                break;
            }
            fed += 1;

            for (_, command) in self.scheduled.iter().filter(|(at, _)| *at == index) {
                if self.commands.send(*command).is_err() {
                    log::warn!("Command listener gone, dropping {command}");
                }
            }

            if !self.interval.is_zero() {
                std::thread::sleep(self.interval);
            }
        }

        reader.close();
        Ok(fed)
    }
}

fn spawn_writer(
    mut writer: Box<dyn FrameWriter>,
    frames: Receiver<Frame>,
) -> std::io::Result<JoinHandle<Result<usize, String>>> {
    std::thread::Builder::new()
        .name("frame-writer".into())
        .spawn(move || {
            let mut written = 0;
            for frame in frames {
                writer.write(&frame).map_err(|e| e.to_string())?;
                written += 1;
            }
            Ok(written)
        })
}

/// Reads controller input until EOF. Never joined: a blocked stdin read
/// cannot be interrupted.
fn spawn_stdin_commands(commands: Sender<Command>, guarding: GuardingMode) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name("stdin-commands".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match parse_control_line(line) {
                    Ok(ControlInput::Guard(enabled)) => {
                        guarding.set(enabled);
                        log::info!("Guarding mode {}", if enabled { "on" } else { "off" });
                    }
                    Ok(ControlInput::Command(command)) => {
                        if commands.send(command).is_err() {
                            break;
                        }
                    }
                    Err(e) => log::warn!("{e}"),
                }
            }
        })?;
    Ok(())
}

#[derive(Debug, PartialEq)]
enum ControlInput {
    Command(Command),
    Guard(bool),
}

fn parse_control_line(line: &str) -> Result<ControlInput, String> {
    let mut words = line.split_whitespace();
    match (words.next(), words.next()) {
        (Some("guard"), Some("on")) => Ok(ControlInput::Guard(true)),
        (Some("guard"), Some("off")) => Ok(ControlInput::Guard(false)),
        (Some(word), None) => word
            .parse::<Command>()
            .map(ControlInput::Command)
            .map_err(|e| e.to_string()),
        _ => Err(format!("Unrecognised input: '{line}'")),
    }
}

fn parse_scheduled(value: &str) -> Result<(usize, Command), String> {
    let (frame, command) = value
        .split_once(':')
        .ok_or_else(|| format!("Expected FRAME:COMMAND, got '{value}'"))?;
    let frame = frame
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("Invalid frame index '{frame}': {e}"))?;
    let command = command.trim().parse::<Command>().map_err(|e| e.to_string())?;
    Ok((frame, command))
}

fn print_reports(reports: &Receiver<PositionReport>) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for report in reports {
        serde_json::to_writer(&mut out, &report)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.is_dir() {
        return Err(format!("Input directory not found: {}", cli.input.display()).into());
    }
    if !cli.detections.is_file() {
        return Err(format!("Detections file not found: {}", cli.detections.display()).into());
    }
    if let Some(output) = &cli.output {
        if output == &cli.input {
            return Err("Output directory must differ from the input directory".into());
        }
    }
    if let Some(config) = &cli.config {
        if !config.is_file() {
            return Err(format!("Config file not found: {}", config.display()).into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scheduled_command() {
        assert_eq!(parse_scheduled("12:enroll-foe"), Ok((12, Command::EnrollAsFoe)));
        assert_eq!(parse_scheduled(" 3 : delete "), Ok((3, Command::Delete)));
    }

    #[test]
    fn test_parse_scheduled_rejects_malformed() {
        assert!(parse_scheduled("recognize").is_err());
        assert!(parse_scheduled("x:recognize").is_err());
        assert!(parse_scheduled("4:wave").is_err());
    }

    #[test]
    fn test_parse_control_line() {
        assert_eq!(parse_control_line("guard on"), Ok(ControlInput::Guard(true)));
        assert_eq!(parse_control_line("guard off"), Ok(ControlInput::Guard(false)));
        assert_eq!(
            parse_control_line("recognize"),
            Ok(ControlInput::Command(Command::Recognize))
        );
        assert!(parse_control_line("guard maybe").is_err());
        assert!(parse_control_line("dance").is_err());
    }
}
