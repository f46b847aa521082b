use log::debug;

use crate::{hardware::Model, interrupt::Interrupt, mmu::IoMap};

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;
/// Bytes in one RGBA8888 frame.
pub const FRAME_BYTES: usize = SCREEN_WIDTH * SCREEN_HEIGHT * 4;

// Mode timing in T-cycles (gbdev.io/pandocs/Rendering.html)
const OAM_SCAN_CYCLES: u32 = 80;
const RENDER_AT_CYCLES: u32 = 160;
const TRANSFER_CYCLES: u32 = 172;
const HBLANK_CYCLES: u32 = 204;
const LINE_CYCLES: u32 = 456;
const VBLANK_CYCLES: u32 = LINE_CYCLES * 10;

const MAX_SPRITES_PER_LINE: usize = 10;
const TOTAL_SPRITES: usize = 40;

pub const VRAM_BANK_SIZE: usize = 0x2000;
pub const OAM_SIZE: usize = 0xA0;
const PAL_INDEX_MASK: u8 = 0x3F;
const PAL_UNUSED_BIT: u8 = 0x40;
const PAL_AUTO_INCREMENT_BIT: u8 = 0x80;

const WINDOW_X_MAX: u8 = 166;

const BG_MAP_0_BASE: usize = 0x1800;
const BG_MAP_1_BASE: usize = 0x1C00;
const TILE_DATA_SIGNED_BASE: usize = 0x1000;

pub const LCDC: u16 = 0xFF40;
pub const STAT: u16 = 0xFF41;
pub const SCY: u16 = 0xFF42;
pub const SCX: u16 = 0xFF43;
pub const LY: u16 = 0xFF44;
pub const LYC: u16 = 0xFF45;
pub const DMA: u16 = 0xFF46;
pub const BGP: u16 = 0xFF47;
pub const OBP0: u16 = 0xFF48;
pub const OBP1: u16 = 0xFF49;
pub const WY: u16 = 0xFF4A;
pub const WX: u16 = 0xFF4B;
pub const VBK: u16 = 0xFF4F;
pub const BCPS: u16 = 0xFF68;
pub const BCPD: u16 = 0xFF69;
pub const OCPS: u16 = 0xFF6A;
pub const OCPD: u16 = 0xFF6B;

const LCDC_ENABLE: u8 = 0x80;
const STAT_COINCIDENCE: u8 = 0x04;
const STAT_HBLANK_IRQ: u8 = 0x08;
const STAT_VBLANK_IRQ: u8 = 0x10;
const STAT_OAM_IRQ: u8 = 0x20;
const STAT_LYC_IRQ: u8 = 0x40;
const STAT_WRITABLE: u8 = 0x78;

const DMG_SHADES: [u8; 4] = [255, 170, 85, 0];

// Palettes the Color boot ROM installs for monochrome cartridges.
const COMPAT_BG_PALETTE: [u16; 4] = [0x7FFF, 0x1BEF, 0x6180, 0x0000];
const COMPAT_OBJ_PALETTE: [u16; 4] = [0x7FFF, 0x421F, 0x1CF2, 0x0000];

/// Receives each finished frame.
pub trait FrameSink {
    /// `frame` is 160x144 RGBA8888, row-major.
    fn present(&mut self, frame: &[u8]);
}

/// Sink that drops every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn present(&mut self, _frame: &[u8]) {}
}

/// LCD mode as reported in STAT bits 0-1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    HBlank = 0,
    VBlank = 1,
    ReadingOam = 2,
    ReadingOamVram = 3,
}

/// One 4-colour Color palette, kept both as written by software and as
/// display colours.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    raw: [u16; 4],
    rgba: [[u8; 4]; 4],
}

impl Palette {
    const fn black() -> Self {
        Self {
            raw: [0; 4],
            rgba: [[0, 0, 0, 0xFF]; 4],
        }
    }

    fn from_raw(raw: [u16; 4]) -> Self {
        let mut pal = Self::black();
        for (i, c) in raw.into_iter().enumerate() {
            pal.set(i, c);
        }
        pal
    }

    fn set(&mut self, color: usize, raw: u16) {
        self.raw[color] = raw & 0x7FFF;
        self.rgba[color] = decode_bgr555(raw);
    }

    pub fn raw(&self, color: usize) -> u16 {
        self.raw[color]
    }

    pub fn rgba(&self, color: usize) -> [u8; 4] {
        self.rgba[color]
    }
}

fn expand5(c: u16) -> u8 {
    let c = (c & 0x1F) as u8;
    (c << 3) | (c >> 2)
}

/// BGR555 hardware colour to RGBA8888.
pub fn decode_bgr555(raw: u16) -> [u8; 4] {
    [expand5(raw), expand5(raw >> 5), expand5(raw >> 10), 0xFF]
}

/// Parsed copy of one OAM entry.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Sprite {
    pub y: u8,
    pub x: u8,
    pub tile: u8,
    pub flags: u8,
}

impl Sprite {
    fn set_byte(&mut self, offset: usize, val: u8) {
        match offset {
            0 => self.y = val,
            1 => self.x = val,
            2 => self.tile = val,
            _ => self.flags = val,
        }
    }
}

/// Progress of a Color VRAM DMA.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HdmaCursor {
    pub source: u16,
    pub dest: u16,
    /// 16-byte blocks still to copy.
    pub remaining: u16,
    /// An HBlank-paced transfer is in progress.
    pub active: bool,
}

pub struct Ppu {
    vram: [[u8; VRAM_BANK_SIZE]; 2],
    vram_bank: usize,
    oam: [u8; OAM_SIZE],
    sprites: [Sprite; TOTAL_SPRITES],

    /// Running on Color hardware.
    cgb: bool,
    /// Color hardware running a Color cartridge: attributes, banked tiles and
    /// palette RAM drive rendering.
    color: bool,

    lcdc: u8,
    stat: u8,
    scy: u8,
    scx: u8,
    ly: u8,
    lyc: u8,
    pub dma: u8,
    bgp: u8,
    obp0: u8,
    obp1: u8,
    wy: u8,
    wx: u8,
    win_line_counter: u8,

    bcps: u8,
    ocps: u8,
    bg_palettes: [Palette; 8],
    obj_palettes: [Palette; 8],

    pub hdma: HdmaCursor,

    mode: Mode,
    mode_clock: u32,
    line_rendered: bool,

    framebuffer: Vec<u8>,
    /// Background/window colour index per pixel.
    color_index: Vec<u8>,
    /// Tile attribute priority bit per pixel (Color only).
    bg_priority: Vec<bool>,
    line_sprites: [(usize, Sprite); MAX_SPRITES_PER_LINE],
    sprite_count: usize,
    /// Sprite height the line's OAM scan selected with.
    line_sprite_height: u8,

    frame_ready: bool,
    frames: u64,
    sink: Box<dyn FrameSink>,
}

impl Ppu {
    /// `cgb_cart` is the header's Color flag. Monochrome cartridges on Color
    /// hardware render through the compatibility palettes.
    pub fn new(model: Model, cgb_cart: bool, sink: Box<dyn FrameSink>) -> Self {
        let cgb = model.is_cgb();
        Self {
            vram: [[0; VRAM_BANK_SIZE]; 2],
            vram_bank: 0,
            oam: [0; OAM_SIZE],
            sprites: [Sprite::default(); TOTAL_SPRITES],
            cgb,
            color: cgb && cgb_cart,
            lcdc: 0,
            stat: 0,
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            dma: 0xFF,
            bgp: 0,
            obp0: 0,
            obp1: 0,
            wy: 0,
            wx: 0,
            win_line_counter: 0,
            bcps: PAL_UNUSED_BIT,
            ocps: PAL_UNUSED_BIT,
            bg_palettes: [Palette::black(); 8],
            obj_palettes: [Palette::black(); 8],
            hdma: HdmaCursor::default(),
            mode: Mode::HBlank,
            mode_clock: 0,
            line_rendered: false,
            framebuffer: vec![0xFF; FRAME_BYTES],
            color_index: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
            bg_priority: vec![false; SCREEN_WIDTH * SCREEN_HEIGHT],
            line_sprites: [(0, Sprite::default()); MAX_SPRITES_PER_LINE],
            sprite_count: 0,
            line_sprite_height: 8,
            frame_ready: false,
            frames: 0,
            sink,
        }
    }

    /// Register state left behind by the boot ROM.
    pub fn apply_boot_state(&mut self) {
        self.lcdc = 0x91;
        self.bgp = 0xFC;
        self.mode = Mode::ReadingOam;
        self.mode_clock = 0;
        self.ly = 0;
        self.stat |= STAT_COINCIDENCE;

        if self.color {
            self.bg_palettes = [Palette::from_raw([0x7FFF; 4]); 8];
        } else if self.cgb {
            self.apply_compat_palettes();
        }
    }

    fn apply_compat_palettes(&mut self) {
        self.bg_palettes[0] = Palette::from_raw(COMPAT_BG_PALETTE);
        self.obj_palettes[0] = Palette::from_raw(COMPAT_OBJ_PALETTE);
        self.obj_palettes[1] = Palette::from_raw(COMPAT_OBJ_PALETTE);
    }

    pub(crate) fn register_io(io: &mut IoMap, model: Model) {
        for addr in LCDC..=WX {
            if addr == DMA {
                continue;
            }
            io.bind(
                addr,
                |mmu, addr| mmu.ppu.read_reg(addr),
                |mmu, addr, val| mmu.ppu.write_reg(addr, val, &mut mmu.if_reg),
            );
        }
        if model.is_cgb() {
            for addr in [VBK, BCPS, BCPD, OCPS, OCPD] {
                io.bind(
                    addr,
                    |mmu, addr| mmu.ppu.read_reg(addr),
                    |mmu, addr, val| mmu.ppu.write_reg(addr, val, &mut mmu.if_reg),
                );
            }
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn ly(&self) -> u8 {
        self.ly
    }

    pub fn lcd_on(&self) -> bool {
        self.lcdc & LCDC_ENABLE != 0
    }

    pub fn in_hblank(&self) -> bool {
        self.mode == Mode::HBlank
    }

    pub fn frame_ready(&self) -> bool {
        self.frame_ready
    }

    pub fn clear_frame_flag(&mut self) {
        self.frame_ready = false;
    }

    /// Frames completed (VBlank entries) since power on.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    pub fn window_line_counter(&self) -> u8 {
        self.win_line_counter
    }

    pub fn bg_palette(&self, index: usize) -> &Palette {
        &self.bg_palettes[index]
    }

    pub fn obj_palette(&self, index: usize) -> &Palette {
        &self.obj_palettes[index]
    }

    pub fn sprite(&self, index: usize) -> Sprite {
        self.sprites[index]
    }

    pub fn read_vram(&self, addr: u16) -> u8 {
        self.vram[self.vram_bank][(addr as usize - 0x8000) & (VRAM_BANK_SIZE - 1)]
    }

    pub fn write_vram(&mut self, addr: u16, val: u8) {
        self.vram[self.vram_bank][(addr as usize - 0x8000) & (VRAM_BANK_SIZE - 1)] = val;
    }

    pub fn read_oam(&self, addr: u16) -> u8 {
        self.oam
            .get(addr as usize - 0xFE00)
            .copied()
            .unwrap_or(0xFF)
    }

    /// OAM writes keep the parsed sprite table in step.
    pub fn write_oam(&mut self, addr: u16, val: u8) {
        let idx = addr as usize - 0xFE00;
        if idx < OAM_SIZE {
            self.oam[idx] = val;
            self.sprites[idx / 4].set_byte(idx % 4, val);
        }
    }

    fn stat_value(&self) -> u8 {
        0x80 | (self.stat & (STAT_WRITABLE | STAT_COINCIDENCE)) | self.mode as u8
    }

    fn palette_index(index: u8) -> usize {
        (index & PAL_INDEX_MASK) as usize
    }

    fn advance_palette_index(index: &mut u8) {
        if *index & PAL_AUTO_INCREMENT_BIT != 0 {
            let next = (*index).wrapping_add(1) & PAL_INDEX_MASK;
            *index = PAL_AUTO_INCREMENT_BIT | PAL_UNUSED_BIT | next;
        }
    }

    fn read_palette_byte(palettes: &[Palette; 8], index: u8) -> u8 {
        let i = Self::palette_index(index);
        let raw = palettes[i / 8].raw((i % 8) / 2);
        if i % 2 == 0 {
            raw as u8
        } else {
            (raw >> 8) as u8
        }
    }

    fn write_palette_byte(palettes: &mut [Palette; 8], index: u8, val: u8) {
        let i = Self::palette_index(index);
        let color = (i % 8) / 2;
        let pal = &mut palettes[i / 8];
        let raw = pal.raw(color);
        let raw = if i % 2 == 0 {
            (raw & 0x7F00) | val as u16
        } else {
            (raw & 0x00FF) | ((val as u16 & 0x7F) << 8)
        };
        pal.set(color, raw);
    }

    pub fn read_reg(&self, addr: u16) -> u8 {
        match addr {
            LCDC => self.lcdc,
            STAT => self.stat_value(),
            SCY => self.scy,
            SCX => self.scx,
            LY => self.ly,
            LYC => self.lyc,
            DMA => self.dma,
            BGP => self.bgp,
            OBP0 => self.obp0,
            OBP1 => self.obp1,
            WY => self.wy,
            WX => self.wx,
            VBK => 0xFE | self.vram_bank as u8,
            BCPS => self.bcps,
            BCPD => Self::read_palette_byte(&self.bg_palettes, self.bcps),
            OCPS => self.ocps,
            OCPD => Self::read_palette_byte(&self.obj_palettes, self.ocps),
            _ => 0xFF,
        }
    }

    /// LCDC and LYC writes can raise LCDStat through `if_reg`.
    pub fn write_reg(&mut self, addr: u16, val: u8, if_reg: &mut u8) {
        match addr {
            LCDC => self.write_lcdc(val, if_reg),
            STAT => self.stat = (self.stat & !STAT_WRITABLE) | (val & STAT_WRITABLE),
            SCY => self.scy = val,
            SCX => self.scx = val,
            LY => {}
            LYC => {
                self.lyc = val;
                if self.lcd_on() {
                    self.update_coincidence(if_reg);
                }
            }
            DMA => self.dma = val,
            BGP => self.bgp = val,
            OBP0 => self.obp0 = val,
            OBP1 => self.obp1 = val,
            WY => self.wy = val,
            WX => self.wx = val,
            VBK if self.cgb => self.vram_bank = (val & 0x01) as usize,
            BCPS if self.cgb => {
                self.bcps = (val & (PAL_AUTO_INCREMENT_BIT | PAL_INDEX_MASK)) | PAL_UNUSED_BIT
            }
            BCPD if self.cgb => {
                Self::write_palette_byte(&mut self.bg_palettes, self.bcps, val);
                Self::advance_palette_index(&mut self.bcps);
            }
            OCPS if self.cgb => {
                self.ocps = (val & (PAL_AUTO_INCREMENT_BIT | PAL_INDEX_MASK)) | PAL_UNUSED_BIT
            }
            OCPD if self.cgb => {
                Self::write_palette_byte(&mut self.obj_palettes, self.ocps, val);
                Self::advance_palette_index(&mut self.ocps);
            }
            _ => {}
        }
    }

    fn write_lcdc(&mut self, val: u8, if_reg: &mut u8) {
        let was_on = self.lcd_on();
        self.lcdc = val;
        match (was_on, self.lcd_on()) {
            (true, false) => {
                debug!("LCD off");
                self.ly = 0;
                self.mode = Mode::HBlank;
                self.mode_clock = 0;
                self.win_line_counter = 0;
            }
            (false, true) => {
                debug!("LCD on");
                self.ly = 0;
                self.mode = Mode::ReadingOam;
                self.mode_clock = 0;
                self.win_line_counter = 0;
                self.update_coincidence(if_reg);
            }
            _ => {}
        }
    }

    fn set_ly(&mut self, ly: u8, if_reg: &mut u8) {
        self.ly = ly;
        self.update_coincidence(if_reg);
    }

    fn update_coincidence(&mut self, if_reg: &mut u8) {
        let was_set = self.stat & STAT_COINCIDENCE != 0;
        if self.ly == self.lyc {
            self.stat |= STAT_COINCIDENCE;
            if !was_set && self.stat & STAT_LYC_IRQ != 0 {
                Interrupt::LcdStat.request(if_reg);
            }
        } else {
            self.stat &= !STAT_COINCIDENCE;
        }
    }

    fn stat_irq(&self, source: u8, if_reg: &mut u8) {
        if self.stat & source != 0 {
            Interrupt::LcdStat.request(if_reg);
        }
    }

    /// Advance by `cycles`. Returns true when HBlank was entered, which is
    /// when an HBlank DMA block is due.
    pub fn step(&mut self, cycles: u32, if_reg: &mut u8) -> bool {
        if !self.lcd_on() {
            return false;
        }

        let mut hblank_entered = false;
        let mut remaining = cycles;
        while remaining > 0 {
            let increment = remaining.min(4);
            remaining -= increment;
            self.mode_clock += increment;

            match self.mode {
                Mode::ReadingOam => {
                    if self.mode_clock >= OAM_SCAN_CYCLES {
                        self.mode_clock -= OAM_SCAN_CYCLES;
                        self.oam_scan();
                        self.line_rendered = false;
                        self.mode = Mode::ReadingOamVram;
                    }
                }
                Mode::ReadingOamVram => {
                    if !self.line_rendered && self.mode_clock >= RENDER_AT_CYCLES {
                        self.render_scanline();
                        self.line_rendered = true;
                    }
                    if self.mode_clock >= TRANSFER_CYCLES {
                        self.mode_clock -= TRANSFER_CYCLES;
                        self.mode = Mode::HBlank;
                        self.stat_irq(STAT_HBLANK_IRQ, if_reg);
                        hblank_entered = true;
                    }
                }
                Mode::HBlank => {
                    if self.mode_clock >= HBLANK_CYCLES {
                        self.mode_clock -= HBLANK_CYCLES;
                        self.set_ly(self.ly + 1, if_reg);
                        if self.ly as usize == SCREEN_HEIGHT {
                            self.enter_vblank(if_reg);
                        } else {
                            self.mode = Mode::ReadingOam;
                            self.stat_irq(STAT_OAM_IRQ, if_reg);
                        }
                    }
                }
                Mode::VBlank => {
                    if self.mode_clock >= VBLANK_CYCLES {
                        self.mode_clock -= VBLANK_CYCLES;
                        self.win_line_counter = 0;
                        self.set_ly(0, if_reg);
                        self.mode = Mode::ReadingOam;
                        self.stat_irq(STAT_OAM_IRQ, if_reg);
                    } else {
                        let line = (SCREEN_HEIGHT as u32 + self.mode_clock / LINE_CYCLES) as u8;
                        if line != self.ly {
                            self.set_ly(line, if_reg);
                        }
                    }
                }
            }
        }
        hblank_entered
    }

    fn enter_vblank(&mut self, if_reg: &mut u8) {
        self.mode = Mode::VBlank;
        Interrupt::VBlank.request(if_reg);
        self.stat_irq(STAT_VBLANK_IRQ, if_reg);
        self.frames = self.frames.wrapping_add(1);
        self.frame_ready = true;
        self.sink.present(&self.framebuffer);
    }

    fn sprite_height(&self) -> u8 {
        if self.lcdc & 0x04 != 0 { 16 } else { 8 }
    }

    /// Collect up to 10 sprites on the current line in drawing priority
    /// order.
    fn oam_scan(&mut self) {
        self.line_sprite_height = self.sprite_height();
        let height = self.line_sprite_height as u16;
        let line = self.ly as u16 + 16;
        self.sprite_count = 0;
        for (i, s) in self.sprites.iter().enumerate() {
            if self.sprite_count == MAX_SPRITES_PER_LINE {
                break;
            }
            let top = s.y as u16;
            if line >= top && line < top + height {
                self.line_sprites[self.sprite_count] = (i, *s);
                self.sprite_count += 1;
            }
        }
        let found = &mut self.line_sprites[..self.sprite_count];
        if self.color {
            found.sort_by_key(|(i, _)| *i);
        } else {
            found.sort_by_key(|(i, s)| (s.x, *i));
        }
    }

    fn tile_row_addr(&self, tile_index: u8, row: usize) -> usize {
        let base = if self.lcdc & 0x10 != 0 {
            tile_index as usize * 16
        } else {
            (TILE_DATA_SIGNED_BASE as isize + (tile_index as i8 as isize) * 16) as usize
        };
        base + row * 2
    }

    fn bg_rgba(&self, palette: usize, color_id: u8) -> [u8; 4] {
        if self.color {
            self.bg_palettes[palette].rgba(color_id as usize)
        } else {
            let shade = (self.bgp >> (color_id * 2)) & 0x03;
            self.mono_rgba(&self.bg_palettes[0], shade)
        }
    }

    fn mono_rgba(&self, compat: &Palette, shade: u8) -> [u8; 4] {
        if self.cgb {
            compat.rgba(shade as usize)
        } else {
            let g = DMG_SHADES[shade as usize];
            [g, g, g, 0xFF]
        }
    }

    fn put_pixel(&mut self, x: usize, rgba: [u8; 4]) {
        let offset = (self.ly as usize * SCREEN_WIDTH + x) * 4;
        self.framebuffer[offset..offset + 4].copy_from_slice(&rgba);
    }

    /// Fetch one background or window pixel from a tile map.
    /// Returns (colour index, palette, attribute priority).
    fn map_pixel(&self, map_base: usize, x: usize, y: usize) -> (u8, usize, bool) {
        let map_offset = map_base + (y / 8) * 32 + x / 8;
        let tile_index = self.vram[0][map_offset];
        let mut col = x % 8;
        let mut row = y % 8;
        let (mut palette, mut bank, mut priority) = (0, 0, false);
        if self.color {
            let attr = self.vram[1][map_offset];
            palette = (attr & 0x07) as usize;
            bank = ((attr >> 3) & 0x01) as usize;
            if attr & 0x20 != 0 {
                col = 7 - col;
            }
            if attr & 0x40 != 0 {
                row = 7 - row;
            }
            priority = attr & 0x80 != 0;
        }
        let addr = self.tile_row_addr(tile_index, row);
        let lo = self.vram[bank][addr];
        let hi = self.vram[bank][addr + 1];
        let bit = 7 - col;
        let color_id = (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1);
        (color_id, palette, priority)
    }

    fn render_scanline(&mut self) {
        let ly = self.ly as usize;
        if ly >= SCREEN_HEIGHT {
            return;
        }
        let row = ly * SCREEN_WIDTH;

        // Monochrome LCDC bit 0 blanks the background and window to colour 0.
        let bg_enabled = self.color || self.lcdc & 0x01 != 0;
        // Color LCDC bit 0 clear strips the background of priority.
        let bg_master_priority = !self.color || self.lcdc & 0x01 != 0;

        let blank = self.bg_rgba(0, 0);
        for x in 0..SCREEN_WIDTH {
            self.put_pixel(x, blank);
            self.color_index[row + x] = 0;
            self.bg_priority[row + x] = false;
        }

        if bg_enabled {
            let map = if self.lcdc & 0x08 != 0 {
                BG_MAP_1_BASE
            } else {
                BG_MAP_0_BASE
            };
            let y = (ly + self.scy as usize) & 0xFF;
            for x in 0..SCREEN_WIDTH {
                let px = (x + self.scx as usize) & 0xFF;
                let (color_id, palette, priority) = self.map_pixel(map, px, y);
                let rgba = self.bg_rgba(palette, color_id);
                self.put_pixel(x, rgba);
                self.color_index[row + x] = color_id;
                self.bg_priority[row + x] = priority;
            }

            if self.lcdc & 0x20 != 0 && self.ly >= self.wy && self.wx <= WINDOW_X_MAX {
                let map = if self.lcdc & 0x40 != 0 {
                    BG_MAP_1_BASE
                } else {
                    BG_MAP_0_BASE
                };
                let wx = self.wx as isize - 7;
                let wy = self.win_line_counter as usize;
                for x in wx.max(0) as usize..SCREEN_WIDTH {
                    let (color_id, palette, priority) =
                        self.map_pixel(map, (x as isize - wx) as usize, wy);
                    let rgba = self.bg_rgba(palette, color_id);
                    self.put_pixel(x, rgba);
                    self.color_index[row + x] = color_id;
                    self.bg_priority[row + x] = priority;
                }
                self.win_line_counter = self.win_line_counter.wrapping_add(1);
            }
        }

        if self.lcdc & 0x02 != 0 {
            self.render_sprites(row, bg_master_priority);
        }
    }

    fn render_sprites(&mut self, row: usize, bg_master_priority: bool) {
        // LCDC bit 2 may have changed since the scan; keep the scan's size.
        let height = self.line_sprite_height;
        let mut drawn = [false; SCREEN_WIDTH];
        for n in 0..self.sprite_count {
            let (_, s) = self.line_sprites[n];
            let mut tile = s.tile;
            if height == 16 {
                tile &= 0xFE;
            }
            let mut line = (self.ly + 16 - s.y) as usize;
            if s.flags & 0x40 != 0 {
                line = height as usize - 1 - line;
            }
            let bank = if self.color {
                ((s.flags >> 3) & 0x01) as usize
            } else {
                0
            };
            let addr = tile as usize * 16 + line * 2;
            let lo = self.vram[bank][addr];
            let hi = self.vram[bank][addr + 1];

            for px in 0..8usize {
                let sx = s.x as isize - 8 + px as isize;
                if !(0..SCREEN_WIDTH as isize).contains(&sx) {
                    continue;
                }
                let sx = sx as usize;
                if drawn[sx] {
                    continue;
                }
                let bit = if s.flags & 0x20 != 0 { px } else { 7 - px };
                let color_id = (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1);
                if color_id == 0 {
                    continue;
                }
                // Lower-priority sprites never show through a higher one,
                // even when the higher one loses to the background.
                drawn[sx] = true;

                let bg_zero = self.color_index[row + sx] == 0;
                if bg_master_priority
                    && !bg_zero
                    && (s.flags & 0x80 != 0 || (self.color && self.bg_priority[row + sx]))
                {
                    continue;
                }

                let rgba = if self.color {
                    self.obj_palettes[(s.flags & 0x07) as usize].rgba(color_id as usize)
                } else {
                    let (obp, compat) = if s.flags & 0x10 != 0 {
                        (self.obp1, 1)
                    } else {
                        (self.obp0, 0)
                    };
                    let shade = (obp >> (color_id * 2)) & 0x03;
                    self.mono_rgba(&self.obj_palettes[compat], shade)
                };
                self.put_pixel(sx, rgba);
            }
        }
    }
}
