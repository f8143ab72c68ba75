// GT7 telemetry decoder.
// Invariants: field offsets come from the layout table only; no range
// validation of physical values beyond structural length checks.

use thiserror::Error;

use crate::layout::{PacketLayout, V1};
use crate::model::TelemetrySample;

/// A plaintext that is structurally unusable. Distinct from a decryption
/// failure: the cipher succeeded but the datagram was truncated.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated packet: {len} bytes, expected {expected}")]
    Truncated { len: usize, expected: usize },
}

/// Maps a decrypted payload onto a typed sample using the versioned layout
/// table. A payload shorter than the fixed packet size is rejected.
pub fn decode_sample(payload: &[u8]) -> Result<TelemetrySample, DecodeError> {
    let layout = &V1;
    if payload.len() < layout.packet_len {
        return Err(DecodeError::Truncated {
            len: payload.len(),
            expected: layout.packet_len,
        });
    }
    decode_fields(payload, layout).ok_or(DecodeError::Truncated {
        len: payload.len(),
        expected: layout.packet_len,
    })
}

fn decode_fields(payload: &[u8], layout: &PacketLayout) -> Option<TelemetrySample> {
    let flags = read_u8(payload, layout.flags)?;
    let gear_byte = read_u8(payload, layout.gear)?;
    let gear_raw = gear_byte & 0x0F;

    Some(TelemetrySample {
        packet_id: read_i32(payload, layout.packet_id)?,
        time_on_track_ms: read_i32(payload, layout.time_on_track_ms)?,

        pos_x: read_f32(payload, layout.pos_x)?,
        pos_y: read_f32(payload, layout.pos_y)?,
        pos_z: read_f32(payload, layout.pos_z)?,
        vel_x: read_f32(payload, layout.vel_x)?,
        vel_y: read_f32(payload, layout.vel_y)?,
        vel_z: read_f32(payload, layout.vel_z)?,

        speed_kph: read_f32(payload, layout.speed_ms)? * 3.6,
        rpm: read_f32(payload, layout.rpm)?,
        gear: if gear_raw == 0 { -1 } else { gear_raw as i8 },
        suggested_gear: gear_byte >> 4,

        throttle: read_u8(payload, layout.throttle)? as f32 / 255.0,
        brake: read_u8(payload, layout.brake)? as f32 / 255.0,
        clutch: read_f32(payload, layout.clutch)?,

        current_lap: read_i16(payload, layout.current_lap)?,
        total_laps: read_i16(payload, layout.total_laps)?,
        best_lap_ms: read_i32(payload, layout.best_lap_ms)?,
        last_lap_ms: read_i32(payload, layout.last_lap_ms)?,

        in_race: (flags & 0b0000_0001) != 0,
        is_paused: (flags & 0b0000_0010) != 0,
        flags,
    })
}

fn read_f32(payload: &[u8], offset: usize) -> Option<f32> {
    let bytes = payload.get(offset..offset + 4)?;
    Some(f32::from_le_bytes(bytes.try_into().ok()?))
}

fn read_u8(payload: &[u8], offset: usize) -> Option<u8> {
    payload.get(offset).copied()
}

fn read_i16(payload: &[u8], offset: usize) -> Option<i16> {
    let bytes = payload.get(offset..offset + 2)?;
    Some(i16::from_le_bytes(bytes.try_into().ok()?))
}

fn read_i32(payload: &[u8], offset: usize) -> Option<i32> {
    let bytes = payload.get(offset..offset + 4)?;
    Some(i32::from_le_bytes(bytes.try_into().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{decrypt_packet, encrypt_packet};

    fn write_f32(buf: &mut [u8], offset: usize, value: f32) {
        buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn write_i32(buf: &mut [u8], offset: usize, value: i32) {
        buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn write_i16(buf: &mut [u8], offset: usize, value: i16) {
        buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    fn fixture_plaintext() -> Vec<u8> {
        let mut buf = vec![0u8; V1.packet_len];
        buf[0..4].copy_from_slice(&V1.magic.to_le_bytes());

        write_f32(&mut buf, V1.pos_x, 120.5);
        write_f32(&mut buf, V1.pos_y, -3.25);
        write_f32(&mut buf, V1.pos_z, 840.0);
        write_f32(&mut buf, V1.vel_x, 41.7);
        write_f32(&mut buf, V1.vel_y, 0.1);
        write_f32(&mut buf, V1.vel_z, -12.4);
        write_f32(&mut buf, V1.rpm, 6450.0);
        write_f32(&mut buf, V1.speed_ms, 50.0);
        write_i32(&mut buf, V1.packet_id, 1_000_123);
        write_i16(&mut buf, V1.current_lap, 3);
        write_i16(&mut buf, V1.total_laps, 10);
        write_i32(&mut buf, V1.best_lap_ms, 92_345);
        write_i32(&mut buf, V1.last_lap_ms, 93_111);
        write_i32(&mut buf, V1.time_on_track_ms, 310_000);
        buf[V1.flags] = 0b0000_0001; // in race, not paused
        buf[V1.gear] = 0x43; // gear 3, suggested 4
        buf[V1.throttle] = 255;
        buf[V1.brake] = 0;
        write_f32(&mut buf, V1.clutch, 0.5);
        buf
    }

    #[test]
    fn decodes_every_documented_field() {
        let sample = decode_sample(&fixture_plaintext()).expect("decode");

        assert_eq!(sample.packet_id, 1_000_123);
        assert_eq!(sample.time_on_track_ms, 310_000);
        assert_eq!(sample.pos_x, 120.5);
        assert_eq!(sample.pos_y, -3.25);
        assert_eq!(sample.pos_z, 840.0);
        assert_eq!(sample.vel_x, 41.7);
        assert_eq!(sample.vel_y, 0.1);
        assert_eq!(sample.vel_z, -12.4);
        assert_eq!(sample.rpm, 6450.0);
        assert_eq!(sample.speed_kph, 180.0);
        assert_eq!(sample.gear, 3);
        assert_eq!(sample.suggested_gear, 4);
        assert_eq!(sample.throttle, 1.0);
        assert_eq!(sample.brake, 0.0);
        assert_eq!(sample.clutch, 0.5);
        assert_eq!(sample.current_lap, 3);
        assert_eq!(sample.total_laps, 10);
        assert_eq!(sample.best_lap_ms, 92_345);
        assert_eq!(sample.last_lap_ms, 93_111);
        assert!(sample.in_race);
        assert!(!sample.is_paused);
        assert_eq!(sample.flags, 0b0000_0001);
    }

    #[test]
    fn encrypted_fixture_round_trips_through_decrypt_then_decode() {
        let plain = fixture_plaintext();
        let encrypted = encrypt_packet(&plain, 0xCAFE_F00D);

        let payload = decrypt_packet(&encrypted).expect("decrypt");
        let sample = decode_sample(&payload).expect("decode");
        assert_eq!(sample.packet_id, 1_000_123);
        assert_eq!(sample.current_lap, 3);
        assert_eq!(sample.speed_kph, 180.0);
    }

    #[test]
    fn gear_zero_maps_to_reverse_neutral() {
        let mut plain = fixture_plaintext();
        plain[V1.gear] = 0x20; // gear 0, suggested 2
        let sample = decode_sample(&plain).expect("decode");
        assert_eq!(sample.gear, -1);
        assert_eq!(sample.suggested_gear, 2);
    }

    #[test]
    fn paused_flag_unpacks() {
        let mut plain = fixture_plaintext();
        plain[V1.flags] = 0b0000_0011;
        let sample = decode_sample(&plain).expect("decode");
        assert!(sample.in_race);
        assert!(sample.is_paused);
    }

    #[test]
    fn rejects_truncated_plaintext() {
        let plain = fixture_plaintext();
        let err = decode_sample(&plain[..V1.packet_len - 1]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                len: V1.packet_len - 1,
                expected: V1.packet_len,
            }
        );
    }

    #[test]
    fn passes_through_implausible_values() {
        let mut plain = fixture_plaintext();
        write_f32(&mut plain, V1.rpm, -500.0);
        let sample = decode_sample(&plain).expect("decode");
        assert_eq!(sample.rpm, -500.0);
    }
}
