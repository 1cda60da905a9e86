//! cvgen - offline control-signal trace
//!
//! Run with: cargo run -- --attack 5 --decay 10 --sustain 512 --hold 1500

mod args;
mod trace;

use std::io::{self, BufWriter, Write};

use clap::Parser;
use color_eyre::eyre::WrapErr;
use cvgen::{
    io::{
        converter::midi_to_control,
        midi::MidiInput,
        panel::{Knob, Switch},
    },
    synth::{control_channel, ControlHandle, Instrument},
    EngineConfig,
};

use args::{parse_hex_bytes, Args};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let args = Args::parse();
    let config = EngineConfig::default()
        .with_midi_channel(args.channel)
        .with_voice_mode(args.mode.into());

    let (mut handle, rx) = control_channel(config.control_queue_capacity);
    let mut instrument = Instrument::new(&config, rx).wrap_err("invalid engine configuration")?;

    send_panel(&mut handle, &args);

    let midi = match &args.midi {
        Some(text) => Some(parse_hex_bytes(text).wrap_err("--midi expects hex bytes")?),
        None => None,
    };
    if let Some(bytes) = &midi {
        send_midi(&mut handle, &config, bytes);
    } else {
        handle.note_on(args.note, args.velocity);
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    writeln!(out, "{}", trace::HEADER)?;

    let every = args.every.max(1);
    for tick in 0..args.ticks {
        if midi.is_none() {
            if let Some(next) = args.next_note {
                if tick == args.hold / 2 {
                    handle.note_on(next, args.velocity);
                    handle.note_off(args.note);
                }
            }
            if tick == args.hold {
                handle.note_off(args.next_note.unwrap_or(args.note));
            }
        }

        let frame = instrument.tick();
        if tick % every == 0 {
            trace::write_row(&mut out, tick, &frame, instrument.active_voices())?;
        }
    }

    out.flush()?;
    Ok(())
}

fn send_panel(handle: &mut ControlHandle, args: &Args) {
    let knobs = [
        (Knob::Attack, args.attack),
        (Knob::Decay, args.decay),
        (Knob::Sustain, args.sustain),
        (Knob::Release, args.release),
        (Knob::Glide, args.glide),
        (Knob::LfoRate, args.lfo_rate),
        (Knob::LfoVcoAmount, args.lfo_vco),
        (Knob::LfoVcfAmount, args.lfo_vcf),
    ];
    for (knob, value) in knobs {
        handle.knob(knob, value);
    }
    handle.switch(Switch::LfoSine, !args.square);
    handle.switch(Switch::LegatoGlide, args.legato);
}

fn send_midi(handle: &mut ControlHandle, config: &EngineConfig, bytes: &[u8]) {
    let mut input = MidiInput::new(config.midi_channel);
    for &byte in bytes {
        if !input.receive(byte) {
            log::warn!("MIDI buffer full, dropped byte {byte:#04x}");
        }
        while let Some(event) = input.next_event() {
            if let Some(msg) = midi_to_control(event, config.midi_channel, config.bend_increments) {
                handle.send(msg);
            }
        }
    }
}
