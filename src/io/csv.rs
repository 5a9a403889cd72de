use std::io::{self, Write};

use crate::sim::TickRecord;
use crate::vehicle::BoatSnapshot;

/// Write the per-tick episode log. The header comes from the first record,
/// so every record must share its action and critic widths.
pub fn write_tick_records<W: Write>(writer: &mut W, records: &[TickRecord]) -> io::Result<()> {
    let Some(first) = records.first() else {
        return Ok(());
    };
    writeln!(writer, "{}", first.header().join(","))?;
    for r in records {
        let row: Vec<String> = r.row().iter().map(|v| format!("{v:.6}")).collect();
        writeln!(writer, "{}", row.join(","))?;
    }
    Ok(())
}

/// Write a boat's telemetry history.
///
/// Columns: time, x_pos, y_pos, psi, v_xp, v_yp, v_x, v_y, psi_dot,
///          power, delta, thrust, alpha, fuel, dest_dist, mu,
///          fx, fy, moment, then one column per sensor reading
pub fn write_boat_history<W: Write>(writer: &mut W, history: &[BoatSnapshot]) -> io::Result<()> {
    write!(
        writer,
        "time,x_pos,y_pos,psi,v_xp,v_yp,v_x,v_y,psi_dot,\
         power,delta,thrust,alpha,fuel,dest_dist,mu,fx,fy,moment"
    )?;
    if let Some(first) = history.first() {
        for (name, _) in &first.sensors {
            write!(writer, ",{name}")?;
        }
    }
    writeln!(writer)?;

    for h in history {
        let s = &h.state;
        write!(
            writer,
            "{:.4},{:.4},{:.4},{:.6},{:.4},{:.4},{:.4},{:.4},{:.6},\
             {:.2},{:.6},{:.3},{:.6},{:.6},{:.4},{:.6},{:.3},{:.3},{:.3}",
            h.time,
            s.pos.x, s.pos.y, s.psi,
            s.vel_local.x, s.vel_local.y,
            s.vel.x, s.vel.y,
            s.psi_dot,
            s.power, s.delta, s.thrust, s.alpha, s.fuel,
            s.dest_dist, s.mu,
            h.forces.fx(), h.forces.fy(), h.forces.moment(),
        )?;
        for (_, value) in &h.sensors {
            write!(writer, ",{value:.4}")?;
        }
        writeln!(writer)?;
    }
    Ok(())
}
