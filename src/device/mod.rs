/// Output sinks for the synthesized IQ stream
pub mod jack;
pub mod wav;
