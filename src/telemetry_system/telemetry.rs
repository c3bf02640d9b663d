use std::io::Write;

/// Snapshot of one tick, handed to reporting and plotting consumers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickRecord {
    pub tick: u32,
    pub position: f64,
    pub thrust: f64,
    pub p_term: f64,
    pub i_term: f64,
    pub d_term: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightSummary {
    pub ticks: u32,
    pub max_altitude: f64,
    pub overshoot: f64,
    pub final_altitude: f64,
    pub final_error: f64,
    pub peak_thrust: f64,
    pub mean_abs_error: f64,
}

pub struct Telemetry {
    records: Vec<TickRecord>,
    setpoint: f64,
    dt: f64,
    max_altitude: f64,
    peak_thrust: f64,
    abs_error_sum: f64,
}

impl Telemetry {
    pub fn new(setpoint: f64, dt: f64) -> Self {
        Telemetry {
            records: Vec::new(),
            setpoint,
            dt,
            max_altitude: f64::MIN,
            peak_thrust: f64::MIN,
            abs_error_sum: 0.0,
        }
    }

    pub fn from_records(setpoint: f64, dt: f64, records: &[TickRecord]) -> Self {
        let mut telemetry = Telemetry::new(setpoint, dt);
        for record in records {
            telemetry.collect_data(record);
        }
        telemetry
    }

    fn format_time(elapsed_time: f64) -> String {
        if elapsed_time >= 60.0 {
            let minutes = (elapsed_time / 60.0).floor();
            let seconds = elapsed_time % 60.0;
            format!("{:.0}m {:.2}s", minutes, seconds)
        } else {
            format!("{:.2}s", elapsed_time)
        }
    }

    fn format_altitude(altitude: f64) -> String {
        if altitude.abs() >= 1000.0 {
            format!("{:.2} km", altitude / 1000.0)
        } else {
            format!("{:.2} m", altitude)
        }
    }

    pub fn collect_data(&mut self, record: &TickRecord) {
        if record.position > self.max_altitude {
            self.max_altitude = record.position;
        }
        if record.thrust > self.peak_thrust {
            self.peak_thrust = record.thrust;
        }
        self.abs_error_sum += (self.setpoint - record.position).abs();
        self.records.push(*record);
    }

    pub fn records(&self) -> &[TickRecord] {
        &self.records
    }

    pub fn elapsed_time(&self, record: &TickRecord) -> f64 {
        f64::from(record.tick) * self.dt
    }

    pub fn summary(&self) -> Option<FlightSummary> {
        let last = self.records.last()?;
        Some(FlightSummary {
            ticks: last.tick,
            max_altitude: self.max_altitude,
            overshoot: (self.max_altitude - self.setpoint).max(0.0),
            final_altitude: last.position,
            final_error: self.setpoint - last.position,
            peak_thrust: self.peak_thrust,
            mean_abs_error: self.abs_error_sum / self.records.len() as f64,
        })
    }

    /// Columns match the altitude, thrust and PID-term panels of a flight plot.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writeln!(writer, "tick,time,position,thrust,p_term,i_term,d_term")?;
        for record in &self.records {
            writeln!(
                writer,
                "{},{:.3},{:.6},{:.6},{:.6},{:.6},{:.6}",
                record.tick,
                self.elapsed_time(record),
                record.position,
                record.thrust,
                record.p_term,
                record.i_term,
                record.d_term
            )?;
        }
        writer.flush()
    }

    pub fn display_data(&self) {
        println!("--- Telemetry Data ---");
        for record in &self.records {
            println!(
                "Time: {} | Altitude: {} | Thrust: {:.2} N | P: {:.3} I: {:.3} D: {:.3}",
                Self::format_time(self.elapsed_time(record)),
                Self::format_altitude(record.position),
                record.thrust,
                record.p_term,
                record.i_term,
                record.d_term
            );
        }
        println!("--- End of Telemetry ---");

        let Some(summary) = self.summary() else {
            println!("\nNo ticks recorded.");
            return;
        };

        println!("\n--- Simulation Summary ---");
        println!("Ticks: {}", summary.ticks);
        println!(
            "Flight Time: {}",
            Self::format_time(f64::from(summary.ticks) * self.dt)
        );
        println!("Setpoint: {}", Self::format_altitude(self.setpoint));
        println!("Max Altitude: {}", Self::format_altitude(summary.max_altitude));
        println!("Overshoot: {}", Self::format_altitude(summary.overshoot));
        println!(
            "Final Altitude: {}",
            Self::format_altitude(summary.final_altitude)
        );
        println!("Final Error: {:.2} m", summary.final_error);
        println!("Mean Absolute Error: {:.2} m", summary.mean_abs_error);
        println!("Peak Thrust: {:.2} N", summary.peak_thrust);
    }
}
