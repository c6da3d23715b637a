use std::path::Path;

use crate::media::domain::media_engine::{MediaEngine, MediaEngineError, MediaInfo};
use crate::shared::constants::SPEECH_SAMPLE_RATE;

const AV_TIME_BASE: f64 = 1_000_000.0;

/// Probes and transcodes media using ffmpeg-next.
///
/// All extraction goes through one decode → resample → Opus encode path:
/// the best audio stream is decoded, resampled to planar f32 mono at
/// 16 kHz, and encoded into an OGG container at the requested bitrate.
/// Segment extraction seeks the demuxer before decoding and caps the
/// number of resampled samples fed to the encoder.
pub struct FfmpegEngine;

impl FfmpegEngine {
    pub fn new() -> Self {
        Self
    }

    fn transcode(
        &self,
        source: &Path,
        output: &Path,
        window: Option<(f64, f64)>,
        bitrate: u32,
    ) -> Result<(), MediaEngineError> {
        ffmpeg_next::init().map_err(transcode_err)?;

        let mut ictx = ffmpeg_next::format::input(source).map_err(|e| MediaEngineError::Open {
            path: source.display().to_string(),
            message: e.to_string(),
        })?;

        // Seek before decoding, like `-ss` before `-i`: cheap and accurate
        // enough for audio streams.
        if let Some((start, _)) = window {
            if start > 0.0 {
                let ts = (start * AV_TIME_BASE) as i64;
                ictx.seek(ts, ..ts).map_err(transcode_err)?;
            }
        }

        let audio_stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .ok_or_else(|| MediaEngineError::NoAudioStream(source.display().to_string()))?;
        let stream_index = audio_stream.index();

        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(audio_stream.parameters())
                .map_err(transcode_err)?;
        let mut decoder = codec_ctx.decoder().audio().map_err(transcode_err)?;

        let mut resampler = ffmpeg_next::software::resampling::Context::get(
            decoder.format(),
            decoder.channel_layout(),
            decoder.rate(),
            ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
            ffmpeg_next::ChannelLayout::MONO,
            SPEECH_SAMPLE_RATE,
        )
        .map_err(transcode_err)?;

        // Set up the Opus encoder and OGG muxer.
        let mut octx = ffmpeg_next::format::output(output).map_err(transcode_err)?;
        let opus_codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::OPUS)
            .ok_or_else(|| MediaEngineError::Transcode("opus encoder not found".to_string()))?;
        let mut ost = octx.add_stream(Some(opus_codec)).map_err(transcode_err)?;
        let ost_index = ost.index();

        let mut encoder = ffmpeg_next::codec::context::Context::new_with_codec(opus_codec)
            .encoder()
            .audio()
            .map_err(transcode_err)?;
        encoder.set_rate(SPEECH_SAMPLE_RATE as i32);
        encoder.set_channel_layout(ffmpeg_next::ChannelLayout::MONO);
        encoder.set_format(ffmpeg_next::format::Sample::F32(
            ffmpeg_next::format::sample::Type::Planar,
        ));
        encoder.set_bit_rate(bitrate as usize);
        encoder.set_time_base(ffmpeg_next::Rational(1, SPEECH_SAMPLE_RATE as i32));

        let mut encoder = encoder.open_as(opus_codec).map_err(transcode_err)?;
        ost.set_parameters(&encoder);

        let enc_time_base = ffmpeg_next::Rational(1, SPEECH_SAMPLE_RATE as i32);
        let frame_size = encoder.frame_size() as usize;
        let effective_frame_size = if frame_size == 0 { 960 } else { frame_size };

        octx.write_header().map_err(transcode_err)?;
        let ost_time_base = octx.stream(ost_index).unwrap().time_base();

        // Remaining sample budget when extracting a bounded segment.
        let mut remaining: Option<usize> =
            window.map(|(_, duration)| (duration * SPEECH_SAMPLE_RATE as f64).round() as usize);

        let mut pending: Vec<f32> = Vec::new();
        let mut pts: i64 = 0;
        let mut decoded_frame = ffmpeg_next::util::frame::audio::Audio::empty();
        let mut resampled_frame = ffmpeg_next::util::frame::audio::Audio::empty();

        'demux: for (stream, packet) in ictx.packets() {
            if stream.index() != stream_index {
                continue;
            }
            decoder.send_packet(&packet).map_err(transcode_err)?;
            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                resampler
                    .run(&decoded_frame, &mut resampled_frame)
                    .map_err(transcode_err)?;
                collect_f32_samples(&resampled_frame, &mut pending, &mut remaining);
                drain_full_frames(
                    &mut encoder,
                    &mut octx,
                    &mut pending,
                    effective_frame_size,
                    &mut pts,
                    ost_index,
                    enc_time_base,
                    ost_time_base,
                )?;
            }
            if remaining == Some(0) {
                break 'demux;
            }
        }

        // Flush the decoder
        decoder.send_eof().map_err(transcode_err)?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            resampler
                .run(&decoded_frame, &mut resampled_frame)
                .map_err(transcode_err)?;
            collect_f32_samples(&resampled_frame, &mut pending, &mut remaining);
        }

        // Flush the resampler (may have buffered samples)
        if let Ok(Some(delay)) = resampler.flush(&mut resampled_frame) {
            if delay.output > 0 {
                collect_f32_samples(&resampled_frame, &mut pending, &mut remaining);
            }
        }

        drain_full_frames(
            &mut encoder,
            &mut octx,
            &mut pending,
            effective_frame_size,
            &mut pts,
            ost_index,
            enc_time_base,
            ost_time_base,
        )?;

        // Final partial frame, then flush the encoder.
        if !pending.is_empty() {
            let tail = std::mem::take(&mut pending);
            send_samples(&mut encoder, &tail, &mut pts)?;
            write_encoded_packets(&mut encoder, &mut octx, ost_index, enc_time_base, ost_time_base)?;
        }
        encoder.send_eof().map_err(transcode_err)?;
        write_encoded_packets(&mut encoder, &mut octx, ost_index, enc_time_base, ost_time_base)?;

        octx.write_trailer().map_err(transcode_err)?;
        Ok(())
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaEngine for FfmpegEngine {
    fn probe(&self, path: &Path) -> Result<MediaInfo, MediaEngineError> {
        ffmpeg_next::init().map_err(transcode_err)?;

        let ictx = ffmpeg_next::format::input(path).map_err(|e| MediaEngineError::Open {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let duration = ictx.duration();
        let duration_seconds = if duration > 0 {
            duration as f64 / AV_TIME_BASE
        } else {
            0.0
        };

        Ok(MediaInfo { duration_seconds })
    }

    fn extract_audio(
        &self,
        source: &Path,
        output: &Path,
        bitrate: u32,
    ) -> Result<(), MediaEngineError> {
        self.transcode(source, output, None, bitrate)
    }

    fn extract_segment(
        &self,
        source: &Path,
        output: &Path,
        start_seconds: f64,
        duration_seconds: f64,
        bitrate: u32,
    ) -> Result<(), MediaEngineError> {
        self.transcode(source, output, Some((start_seconds, duration_seconds)), bitrate)
    }
}

fn transcode_err(e: ffmpeg_next::Error) -> MediaEngineError {
    MediaEngineError::Transcode(e.to_string())
}

/// Append f32 samples from a planar mono resampled frame, honoring the
/// remaining sample budget when one is set.
fn collect_f32_samples(
    frame: &ffmpeg_next::util::frame::audio::Audio,
    out: &mut Vec<f32>,
    remaining: &mut Option<usize>,
) {
    let num_samples = frame.samples();
    if num_samples == 0 {
        return;
    }
    let take = match remaining {
        Some(0) => return,
        Some(n) => num_samples.min(*n),
        None => num_samples,
    };
    let data = frame.data(0);
    let floats = unsafe { std::slice::from_raw_parts(data.as_ptr() as *const f32, take) };
    out.extend_from_slice(floats);
    if let Some(n) = remaining {
        *n -= take;
    }
}

/// Encode every complete frame currently buffered in `pending`.
#[allow(clippy::too_many_arguments)]
fn drain_full_frames(
    encoder: &mut ffmpeg_next::codec::encoder::audio::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    pending: &mut Vec<f32>,
    frame_size: usize,
    pts: &mut i64,
    stream_index: usize,
    enc_time_base: ffmpeg_next::Rational,
    ost_time_base: ffmpeg_next::Rational,
) -> Result<(), MediaEngineError> {
    while pending.len() >= frame_size {
        let chunk: Vec<f32> = pending.drain(..frame_size).collect();
        send_samples(encoder, &chunk, pts)?;
        write_encoded_packets(encoder, octx, stream_index, enc_time_base, ost_time_base)?;
    }
    Ok(())
}

fn send_samples(
    encoder: &mut ffmpeg_next::codec::encoder::audio::Encoder,
    samples: &[f32],
    pts: &mut i64,
) -> Result<(), MediaEngineError> {
    let mut frame = ffmpeg_next::util::frame::audio::Audio::new(
        ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
        samples.len(),
        ffmpeg_next::ChannelLayout::MONO,
    );
    frame.set_rate(SPEECH_SAMPLE_RATE);
    frame.set_pts(Some(*pts));

    // Copy f32 samples into the frame's data plane
    let dst = frame.data_mut(0);
    let src_bytes =
        unsafe { std::slice::from_raw_parts(samples.as_ptr() as *const u8, samples.len() * 4) };
    dst[..src_bytes.len()].copy_from_slice(src_bytes);

    encoder.send_frame(&frame).map_err(transcode_err)?;
    *pts += samples.len() as i64;
    Ok(())
}

fn write_encoded_packets(
    encoder: &mut ffmpeg_next::codec::encoder::audio::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_index: usize,
    enc_time_base: ffmpeg_next::Rational,
    ost_time_base: ffmpeg_next::Rational,
) -> Result<(), MediaEngineError> {
    let mut encoded = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut encoded).is_ok() {
        encoded.set_stream(stream_index);
        encoded.rescale_ts(enc_time_base, ost_time_base);
        encoded.write_interleaved(octx).map_err(transcode_err)?;
    }
    Ok(())
}
