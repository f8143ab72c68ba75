// Byte offsets and encodings for the GT7 "A" telemetry packet.
// The table is the wire contract for one protocol version; a new packet
// revision gets a new const rather than edits scattered across the parser.

/// Declarative offset table for one decrypted packet layout.
///
/// All multi-byte fields are little-endian. Offsets are into the decrypted
/// payload, which must be at least `packet_len` bytes long.
#[derive(Clone, Copy, Debug)]
pub struct PacketLayout {
    pub version: &'static str,
    /// Full decrypted packet length in bytes.
    pub packet_len: usize,
    /// Expected marker value at `magic_offset` after decryption.
    pub magic: u32,
    pub magic_offset: usize,
    /// Location of the 4-byte IV seed inside the *encrypted* datagram.
    pub iv_offset: usize,

    // f32 triplets
    pub pos_x: usize,
    pub pos_y: usize,
    pub pos_z: usize,
    pub vel_x: usize,
    pub vel_y: usize,
    pub vel_z: usize,

    // engine and speed, f32
    pub rpm: usize,
    pub speed_ms: usize,

    // counters and lap times
    pub packet_id: usize,        // i32
    pub current_lap: usize,      // i16
    pub total_laps: usize,       // i16
    pub best_lap_ms: usize,      // i32
    pub last_lap_ms: usize,      // i32
    pub time_on_track_ms: usize, // i32

    // bit-packed and u8 inputs
    pub flags: usize,    // u8: bit0 in-race, bit1 paused
    pub gear: usize,     // u8: low nibble gear, high nibble suggested
    pub throttle: usize, // u8, 0..=255
    pub brake: usize,    // u8, 0..=255
    pub clutch: usize,   // f32, 0.0..=1.0
}

/// GT7 packet layout as shipped since release ("Simulator Interface Packet
/// GT7 ver 0.0", 296 bytes).
pub const V1: PacketLayout = PacketLayout {
    version: "A",
    packet_len: 0x128,
    magic: 0x4737_5330,
    magic_offset: 0x00,
    iv_offset: 0x40,

    pos_x: 0x04,
    pos_y: 0x08,
    pos_z: 0x0C,
    vel_x: 0x10,
    vel_y: 0x14,
    vel_z: 0x18,

    rpm: 0x3C,
    speed_ms: 0x4C,

    packet_id: 0x70,
    current_lap: 0x74,
    total_laps: 0x76,
    best_lap_ms: 0x78,
    last_lap_ms: 0x7C,
    time_on_track_ms: 0x80,

    flags: 0x8E,
    gear: 0x90,
    throttle: 0x91,
    brake: 0x92,
    clutch: 0xF4,
};
