use attn_engine::{CollaboratorError, Tone};
use log::debug;
use rodio::source::SineWave;
use rodio::{OutputStream, Sink, Source};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

/// Handle to the thread that owns the output stream.
///
/// `OutputStream` is not `Send`, so the stream and sink live on a dedicated
/// thread and tones are handed over through a channel.
pub struct ToneEngine {
    tx: Sender<Tone>,
}

impl ToneEngine {
    /// Opens the default output device, waiting until the audio thread reports
    /// whether it succeeded.
    pub fn spawn() -> Result<Self, CollaboratorError> {
        let (tx, rx) = mpsc::channel::<Tone>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let _ = ready_tx.send(Err(format!("no output stream: {e}")));
                        return;
                    }
                };
                let sink = match Sink::try_new(&handle) {
                    Ok(sink) => sink,
                    Err(e) => {
                        let _ = ready_tx.send(Err(format!("no audio sink: {e}")));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                while let Ok(tone) = rx.recv() {
                    debug!("tone {} Hz gain {:.3}", tone.frequency_hz, tone.gain);
                    sink.append(
                        SineWave::new(tone.frequency_hz)
                            .take_duration(Duration::from_millis(tone.duration_ms))
                            .amplify(tone.gain),
                    );
                }
            })
            .map_err(|e| CollaboratorError::AudioUnavailable(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self { tx }),
            Ok(Err(reason)) => Err(CollaboratorError::AudioUnavailable(reason)),
            Err(_) => Err(CollaboratorError::AudioUnavailable(
                "audio thread exited during startup".to_string(),
            )),
        }
    }

    pub fn play(&self, tone: &Tone) -> Result<(), CollaboratorError> {
        self.tx
            .send(*tone)
            .map_err(|_| CollaboratorError::AudioUnavailable("audio thread stopped".to_string()))
    }
}
