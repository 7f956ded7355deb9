//! Driver and sink lookup over canonical signal bits.
//!
//! A [`Pin`] addresses one bit of one port of one cell. The [`NetIndex`] answers
//! "which pin drives this bit" and "which pins consume this bit", comparing
//! bits through the [`SigMap`] it was created with.
//!
//! Lookups are served from maps keyed by canonical bit. The maps are rebuilt
//! lazily whenever the module [`generation`] moved since they were built, so
//! the index can be kept across mutations of the module.
//!
//! [`generation`]: crate::netlist::Module::generation

use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
};

use crate::{
    netlist::{CellId, CellLibrary, Module, PortDirection, SigBit},
    sigmap::SigMap,
};

/// One bit of one port of a cell, used for both drivers and sinks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pin {
    pub cell: CellId,
    pub port: String,
    pub bit: usize,
}

impl Pin {
    pub fn new(cell: CellId, port: &str, bit: usize) -> Self {
        Pin {
            cell,
            port: port.to_string(),
            bit,
        }
    }

    /// The signal bit currently connected to this pin, if the cell and port exist.
    pub fn sig_bit(&self, module: &Module) -> Option<SigBit> {
        module.cell(self.cell)?.port(&self.port)?.bit(self.bit)
    }
}

impl Display for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}[{}]", self.cell, self.port, self.bit)
    }
}

/// Cached driver/sink maps of a module.
#[derive(Debug)]
pub struct NetIndex<'a> {
    library: &'a CellLibrary,
    sigmap: SigMap,
    /// Generation of the module the maps were built at.
    generation: Option<u64>,
    drivers: HashMap<SigBit, Pin>,
    sinks: HashMap<SigBit, Vec<Pin>>,
    /// Canonical bits of the module output ports, and bits connected to ports
    /// of unknown direction.
    observed: HashSet<SigBit>,
}

impl<'a> NetIndex<'a> {
    /// Creates the index, building the [`SigMap`] of the module.
    ///
    /// The sigmap is not rebuilt afterwards, only the driver and sink maps are.
    pub fn new(module: &Module, library: &'a CellLibrary) -> Self {
        NetIndex {
            library,
            sigmap: SigMap::new(module),
            generation: None,
            drivers: HashMap::new(),
            sinks: HashMap::new(),
            observed: HashSet::new(),
        }
    }

    pub fn sigmap(&self) -> &SigMap {
        &self.sigmap
    }

    pub fn library(&self) -> &'a CellLibrary {
        self.library
    }

    fn refresh(&mut self, module: &Module) {
        if self.generation == Some(module.generation()) {
            return;
        }

        self.drivers.clear();
        self.sinks.clear();
        self.observed.clear();

        for (id, cell) in module.cells() {
            for (port, sig) in cell.connections() {
                let direction = self.library.port_direction(cell.get_type(), port);
                for (bit, sigbit) in sig.bits().iter().enumerate() {
                    if !sigbit.is_wire() {
                        continue;
                    }
                    let canonical = self.sigmap.bit(*sigbit);
                    match direction {
                        Some(PortDirection::Input) => self
                            .sinks
                            .entry(canonical)
                            .or_default()
                            .push(Pin::new(id, port, bit)),
                        // First driver wins if the bit is driven several times.
                        Some(PortDirection::Output) => {
                            self.drivers
                                .entry(canonical)
                                .or_insert_with(|| Pin::new(id, port, bit));
                        }
                        // Unknown direction, it may read the bit
                        None => {
                            self.observed.insert(canonical);
                        }
                    }
                }
            }
        }

        for (id, wire) in module.wires() {
            if wire.port_output {
                for offset in 0..wire.get_width() {
                    self.observed.insert(self.sigmap.bit(SigBit::wire(id, offset)));
                }
            }
        }

        self.generation = Some(module.generation());
    }

    /// The pin driving `bit`, if any. Constants are never driven by a pin.
    pub fn find_driver(&mut self, module: &Module, bit: SigBit) -> Option<Pin> {
        if !bit.is_wire() {
            return None;
        }
        self.refresh(module);
        self.drivers.get(&self.sigmap.bit(bit)).cloned()
    }

    /// All input pins connected to `bit`, in cell, then port, then bit order.
    pub fn find_sinks(&mut self, module: &Module, bit: SigBit) -> Vec<Pin> {
        if !bit.is_wire() {
            return Vec::new();
        }
        self.refresh(module);
        self.sinks
            .get(&self.sigmap.bit(bit))
            .cloned()
            .unwrap_or_default()
    }

    /// True if `bit` is visible outside the module through an output port, or
    /// connected to a port whose direction is unknown (an opaque cell).
    ///
    /// Such bits have readers [`find_sinks`] does not report.
    ///
    /// [`find_sinks`]: NetIndex::find_sinks
    pub fn is_observed(&mut self, module: &Module, bit: SigBit) -> bool {
        self.refresh(module);
        self.observed.contains(&self.sigmap.bit(bit))
    }

    /// Sinks of the bit connected to an output pin. Empty if `driver` is not an output pin.
    pub fn sinks_of(&mut self, module: &Module, driver: &Pin) -> Vec<Pin> {
        let Some(cell) = module.cell(driver.cell) else {
            return Vec::new();
        };
        if !self.library.is_output(cell.get_type(), &driver.port) {
            return Vec::new();
        }
        match driver.sig_bit(module) {
            Some(bit) => self.find_sinks(module, bit),
            None => Vec::new(),
        }
    }

    /// Driver of the bit connected to an input pin. `None` if `sink` is not an input pin.
    pub fn driver_of(&mut self, module: &Module, sink: &Pin) -> Option<Pin> {
        let cell = module.cell(sink.cell)?;
        if !self.library.is_input(cell.get_type(), &sink.port) {
            return None;
        }
        let bit = sink.sig_bit(module)?;
        self.find_driver(module, bit)
    }
}
