//! WAV Merger - 基于 symphonia 的音频拼接器
//!
//! 支持：
//! - base64 解码与 WAV 头校验
//! - 多段 PCM 顺序拼接（不同采样率/声道自动对齐到第一段）
//! - 导出 WAV 或 Opus (OGG 容器)

use base64::{engine::general_purpose, Engine as _};
use ogg::writing::PacketWriter;
use opus::{Application, Channels, Encoder};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{
    AudioFormat, AudioMergeError, AudioMergerPort, MergeConfig, MergedAudio,
};
use crate::domain::EncodedAudio;

/// 空时间线使用的采样率
pub const EMPTY_TIMELINE_SAMPLE_RATE: u32 = 16000;

/// 将 16 位 PCM 样本封装为 WAV
pub fn encode_pcm16_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample / 8) as u32;
    let block_align = channels * (bits_per_sample / 8);

    let data_size = samples.len() * 2;
    let file_size = 36 + data_size;

    let mut wav = Vec::with_capacity(44 + data_size);

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(file_size as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(data_size as u32).to_le_bytes());

    for sample in samples {
        wav.extend_from_slice(&sample.to_le_bytes());
    }

    wav
}

/// WAV 拼接器
pub struct WavMerger;

impl WavMerger {
    pub fn new() -> Self {
        Self
    }

    /// 解析并校验 WAV 文件头
    fn parse_wav_header(&self, data: &[u8]) -> Result<WavHeader, AudioMergeError> {
        if data.len() < 44 {
            return Err(AudioMergeError::InvalidWav("WAV data too short".to_string()));
        }

        if &data[0..4] != b"RIFF" {
            return Err(AudioMergeError::InvalidWav(
                "missing RIFF header".to_string(),
            ));
        }

        if &data[8..12] != b"WAVE" {
            return Err(AudioMergeError::InvalidWav(
                "missing WAVE identifier".to_string(),
            ));
        }

        let mut pos = 12;
        let mut fmt_chunk: Option<FmtChunk> = None;
        let mut data_chunk: Option<(usize, usize)> = None;

        while pos + 8 <= data.len() {
            let chunk_id = &data[pos..pos + 4];
            let chunk_size =
                u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]])
                    as usize;

            match chunk_id {
                b"fmt " => {
                    if chunk_size < 16 || pos + 8 + 16 > data.len() {
                        return Err(AudioMergeError::InvalidWav(
                            "invalid fmt chunk size".to_string(),
                        ));
                    }
                    let fmt_data = &data[pos + 8..pos + 8 + 16];
                    fmt_chunk = Some(FmtChunk {
                        num_channels: u16::from_le_bytes([fmt_data[2], fmt_data[3]]),
                        sample_rate: u32::from_le_bytes([
                            fmt_data[4],
                            fmt_data[5],
                            fmt_data[6],
                            fmt_data[7],
                        ]),
                        bits_per_sample: u16::from_le_bytes([fmt_data[14], fmt_data[15]]),
                    });
                }
                b"data" => {
                    data_chunk = Some((pos + 8, chunk_size));
                    break;
                }
                _ => {}
            }

            pos += 8 + chunk_size;
            // 对齐到偶数字节
            if chunk_size % 2 != 0 {
                pos += 1;
            }
        }

        let fmt = fmt_chunk
            .ok_or_else(|| AudioMergeError::InvalidWav("missing fmt chunk".to_string()))?;
        let (data_offset, data_size) = data_chunk
            .ok_or_else(|| AudioMergeError::InvalidWav("missing data chunk".to_string()))?;

        if fmt.num_channels == 0 || fmt.sample_rate == 0 {
            return Err(AudioMergeError::InvalidWav(
                "zero channels or sample rate".to_string(),
            ));
        }

        Ok(WavHeader {
            fmt,
            data_offset,
            data_size,
        })
    }

    /// 使用 symphonia 解码 WAV 获取 PCM 数据
    fn decode_wav_to_pcm(&self, data: Vec<u8>) -> Result<DecodedAudio, AudioMergeError> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

        let mut hint = Hint::new();
        hint.with_extension("wav");

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioMergeError::DecodingError(format!("Probe failed: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| AudioMergeError::DecodingError("No audio track found".to_string()))?;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| AudioMergeError::DecodingError("Unknown sample rate".to_string()))?;

        let channels = track
            .codec_params
            .channels
            .map(|c| c.count() as u8)
            .ok_or_else(|| AudioMergeError::DecodingError("Unknown channel count".to_string()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| {
                AudioMergeError::DecodingError(format!("Decoder creation failed: {}", e))
            })?;

        let mut samples: Vec<f32> = Vec::new();
        let track_id = track.id;

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(symphonia::core::errors::Error::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    return Err(AudioMergeError::DecodingError(format!(
                        "Packet read error: {}",
                        e
                    )));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("Decode error (skipping packet): {}", e);
                    continue;
                }
            };

            let spec = *decoded.spec();
            let num_frames = decoded.frames();
            let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            let actual_samples = num_frames * spec.channels.count();
            samples.extend(&sample_buf.samples()[..actual_samples]);
        }

        Ok(DecodedAudio {
            samples,
            sample_rate,
            channels,
        })
    }

    /// 解码单段 base64 音频
    ///
    /// 允许 base64 中夹带换行等空白
    fn decode_clip(&self, index: usize, clip: &EncodedAudio) -> Result<DecodedAudio, AudioMergeError> {
        let compact: Vec<u8> = clip
            .as_str()
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        let mut bytes = general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| AudioMergeError::InvalidBase64(format!("clip {}: {}", index, e)))?;

        let mut header = self.parse_wav_header(&bytes).map_err(|e| match e {
            AudioMergeError::InvalidWav(msg) => {
                AudioMergeError::InvalidWav(format!("clip {}: {}", index, msg))
            }
            other => other,
        })?;

        // 流式编码器会先写 0 占位，此时以实际剩余字节为准
        if header.data_size == 0 {
            header.data_size = patch_placeholder_sizes(&mut bytes, &header);
        }

        if header.data_size == 0 {
            return Ok(DecodedAudio {
                samples: Vec::new(),
                sample_rate: header.fmt.sample_rate,
                channels: header.fmt.num_channels as u8,
            });
        }

        tracing::trace!(
            clip = index,
            sample_rate = header.fmt.sample_rate,
            channels = header.fmt.num_channels,
            bits_per_sample = header.fmt.bits_per_sample,
            "Decoding clip"
        );

        self.decode_wav_to_pcm(bytes)
    }

    /// 将 PCM f32 样本编码为 WAV
    fn encode_wav(&self, pcm: &DecodedAudio) -> Vec<u8> {
        let samples: Vec<i16> = pcm.samples.iter().map(|&s| f32_to_i16(s)).collect();
        encode_pcm16_wav(&samples, pcm.sample_rate, pcm.channels as u16)
    }

    /// 将 PCM f32 样本编码为 Opus (OGG 容器)
    fn encode_opus(&self, pcm: &DecodedAudio, bitrate: u32) -> Result<Vec<u8>, AudioMergeError> {
        // Opus 支持的采样率: 8000, 12000, 16000, 24000, 48000
        let target_sample_rate = opus_compatible_sample_rate(pcm.sample_rate);

        let (samples, sample_rate) = if target_sample_rate != pcm.sample_rate {
            (
                resample(&pcm.samples, pcm.sample_rate, target_sample_rate, pcm.channels),
                target_sample_rate,
            )
        } else {
            (pcm.samples.clone(), pcm.sample_rate)
        };

        // Opus 仅支持单声道或立体声
        let (channels, samples) = if pcm.channels == 1 {
            (Channels::Mono, samples)
        } else {
            (Channels::Stereo, convert_channels(&samples, pcm.channels, 2))
        };
        let channel_count: usize = if pcm.channels == 1 { 1 } else { 2 };

        let mut encoder = Encoder::new(sample_rate, channels, Application::Voip).map_err(|e| {
            AudioMergeError::EncodingError(format!("Failed to create Opus encoder: {}", e))
        })?;

        encoder
            .set_bitrate(opus::Bitrate::Bits(bitrate as i32))
            .map_err(|e| AudioMergeError::EncodingError(format!("Failed to set bitrate: {}", e)))?;

        // 编码器延迟 (lookahead) 作为 pre-skip
        let pre_skip = encoder.get_lookahead().map(|l| l as u16).unwrap_or(312);

        let pcm_i16: Vec<i16> = samples.iter().map(|&s| f32_to_i16(s)).collect();

        // 20ms frame
        let frame_size = (sample_rate as usize * 20) / 1000;
        let samples_per_frame = frame_size * channel_count;

        let mut ogg_data = Vec::new();
        {
            let mut packet_writer = PacketWriter::new(&mut ogg_data);

            let opus_head = create_opus_head(channel_count as u8, sample_rate, pre_skip);
            packet_writer
                .write_packet(opus_head, 0, ogg::PacketWriteEndInfo::EndPage, 0)
                .map_err(|e| {
                    AudioMergeError::EncodingError(format!("Failed to write Opus head: {}", e))
                })?;

            packet_writer
                .write_packet(create_opus_tags(), 0, ogg::PacketWriteEndInfo::EndPage, 0)
                .map_err(|e| {
                    AudioMergeError::EncodingError(format!("Failed to write Opus tags: {}", e))
                })?;

            let mut output_buf = vec![0u8; 4000]; // Opus 最大包大小

            // RFC 7845: granule position 以 48kHz 样本数计
            let granule_scale = 48000.0 / sample_rate as f64;
            let frame_granule = (frame_size as f64 * granule_scale) as u64;
            let mut granule_pos: u64 = (pre_skip as f64 * granule_scale) as u64;

            for chunk in pcm_i16.chunks(samples_per_frame) {
                let frame = if chunk.len() < samples_per_frame {
                    let mut padded = chunk.to_vec();
                    padded.resize(samples_per_frame, 0);
                    padded
                } else {
                    chunk.to_vec()
                };

                let encoded_len = encoder.encode(&frame, &mut output_buf).map_err(|e| {
                    AudioMergeError::EncodingError(format!("Opus encode failed: {}", e))
                })?;

                granule_pos += frame_granule;

                packet_writer
                    .write_packet(
                        output_buf[..encoded_len].to_vec(),
                        0,
                        ogg::PacketWriteEndInfo::NormalPacket,
                        granule_pos,
                    )
                    .map_err(|e| {
                        AudioMergeError::EncodingError(format!(
                            "Failed to write Opus packet: {}",
                            e
                        ))
                    })?;
            }

            // 刷新编码器缓冲区中剩余的样本，至少写一帧以结束流
            let flush_frames = ((pre_skip as usize + samples_per_frame - 1) / samples_per_frame).max(1);
            let silence_frame = vec![0i16; samples_per_frame];
            for flush_idx in 0..flush_frames {
                let encoded_len = encoder.encode(&silence_frame, &mut output_buf).map_err(|e| {
                    AudioMergeError::EncodingError(format!("Opus flush encode failed: {}", e))
                })?;

                granule_pos += frame_granule;

                let end_info = if flush_idx == flush_frames - 1 {
                    ogg::PacketWriteEndInfo::EndStream
                } else {
                    ogg::PacketWriteEndInfo::NormalPacket
                };

                packet_writer
                    .write_packet(output_buf[..encoded_len].to_vec(), 0, end_info, granule_pos)
                    .map_err(|e| {
                        AudioMergeError::EncodingError(format!(
                            "Failed to write Opus flush packet: {}",
                            e
                        ))
                    })?;
            }
        }

        Ok(ogg_data)
    }
}

impl Default for WavMerger {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct WavHeader {
    fmt: FmtChunk,
    /// data 块负载的起始偏移
    data_offset: usize,
    data_size: usize,
}

/// 按 data 块之后的实际字节数回填 RIFF 与 data 块大小，返回新的 data 大小
fn patch_placeholder_sizes(bytes: &mut [u8], header: &WavHeader) -> usize {
    let block_align =
        (header.fmt.num_channels as usize * (header.fmt.bits_per_sample as usize / 8)).max(1);
    let available = bytes.len().saturating_sub(header.data_offset);
    let data_size = available - available % block_align;
    if data_size == 0 {
        return 0;
    }

    let riff_size = (bytes.len() - 8) as u32;
    bytes[4..8].copy_from_slice(&riff_size.to_le_bytes());
    bytes[header.data_offset - 4..header.data_offset]
        .copy_from_slice(&(data_size as u32).to_le_bytes());

    tracing::debug!(data_size, "Patched placeholder WAV data size");
    data_size
}

#[derive(Debug)]
struct FmtChunk {
    num_channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

#[derive(Debug)]
struct DecodedAudio {
    /// 交错排列的样本
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u8,
}

impl DecodedAudio {
    fn empty(sample_rate: u32, channels: u8) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
            channels,
        }
    }

    fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000) / (self.sample_rate as u64 * self.channels as u64)
    }

    /// 追加一段音频，必要时先对齐声道与采样率
    fn append(&mut self, clip: DecodedAudio) {
        let samples = if clip.channels != self.channels {
            convert_channels(&clip.samples, clip.channels, self.channels)
        } else {
            clip.samples
        };
        let samples = if clip.sample_rate != self.sample_rate {
            resample(&samples, clip.sample_rate, self.sample_rate, self.channels)
        } else {
            samples
        };
        self.samples.extend(samples);
    }
}

impl AudioMergerPort for WavMerger {
    fn merge(
        &self,
        clips: &[EncodedAudio],
        config: &MergeConfig,
    ) -> Result<MergedAudio, AudioMergeError> {
        let mut timeline: Option<DecodedAudio> = None;

        for (index, clip) in clips.iter().enumerate() {
            let decoded = self.decode_clip(index, clip)?;
            match timeline.as_mut() {
                Some(t) => t.append(decoded),
                None => timeline = Some(decoded),
            }
        }

        let timeline =
            timeline.unwrap_or_else(|| DecodedAudio::empty(EMPTY_TIMELINE_SAMPLE_RATE, 1));

        let data = match config.format {
            AudioFormat::Wav => self.encode_wav(&timeline),
            AudioFormat::Opus => self.encode_opus(&timeline, config.bitrate)?,
        };

        let merged = MergedAudio {
            data,
            format: config.format,
            sample_rate: timeline.sample_rate,
            channels: timeline.channels,
            duration_ms: timeline.duration_ms(),
            clip_count: clips.len(),
        };

        tracing::debug!(
            clips = merged.clip_count,
            format = %merged.format,
            duration_ms = merged.duration_ms,
            size = merged.data.len(),
            "Merged audio clips"
        );

        Ok(merged)
    }
}

fn f32_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    (clamped * 32767.0).round() as i16
}

/// 获取 Opus 兼容的采样率
fn opus_compatible_sample_rate(sample_rate: u32) -> u32 {
    match sample_rate {
        8000 | 12000 | 16000 | 24000 | 48000 => sample_rate,
        r if r <= 8000 => 8000,
        r if r <= 12000 => 12000,
        r if r <= 16000 => 16000,
        r if r <= 24000 => 24000,
        _ => 48000,
    }
}

/// 声道转换：多声道下混为单声道，单声道复制到多声道
fn convert_channels(samples: &[f32], from: u8, to: u8) -> Vec<f32> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }
    let from = from as usize;
    let to = to as usize;

    samples
        .chunks(from)
        .flat_map(|frame| {
            let mono = frame.iter().sum::<f32>() / frame.len() as f32;
            if to == 1 {
                vec![mono]
            } else if from == 1 {
                vec![frame[0]; to]
            } else {
                (0..to)
                    .map(|ch| frame.get(ch).copied().unwrap_or(mono))
                    .collect()
            }
        })
        .collect()
}

/// 简单线性重采样
fn resample(samples: &[f32], from_rate: u32, to_rate: u32, channels: u8) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let channel_count = channels.max(1) as usize;
    let frame_count = samples.len() / channel_count;
    let new_frame_count = (frame_count as f64 * ratio) as usize;
    let mut resampled = Vec::with_capacity(new_frame_count * channel_count);

    for i in 0..new_frame_count {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos as usize;
        let frac = src_pos - src_idx as f64;

        for ch in 0..channel_count {
            let idx0 = src_idx * channel_count + ch;
            let idx1 = ((src_idx + 1).min(frame_count - 1)) * channel_count + ch;

            let s0 = samples.get(idx0).copied().unwrap_or(0.0);
            let s1 = samples.get(idx1).copied().unwrap_or(s0);

            resampled.push(s0 + (s1 - s0) * frac as f32);
        }
    }

    resampled
}

/// 创建 Opus Head 包 (RFC 7845)
fn create_opus_head(channels: u8, sample_rate: u32, pre_skip: u16) -> Vec<u8> {
    let mut head = Vec::with_capacity(19);
    head.extend_from_slice(b"OpusHead");
    head.push(1); // Version
    head.push(channels);
    head.extend_from_slice(&pre_skip.to_le_bytes());
    head.extend_from_slice(&sample_rate.to_le_bytes());
    head.extend_from_slice(&0i16.to_le_bytes()); // Output gain
    head.push(0); // Channel mapping family
    head
}

/// 创建 Opus Tags 包
fn create_opus_tags() -> Vec<u8> {
    let vendor = "storyteller";
    let mut tags = Vec::new();
    tags.extend_from_slice(b"OpusTags");
    tags.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    tags.extend_from_slice(vendor.as_bytes());
    tags.extend_from_slice(&0u32.to_le_bytes()); // No user comments
    tags
}
